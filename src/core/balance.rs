//! Reference balance tables for the tiered progression ruleset.
//!
//! All numbers describing the reference variant live here.
//! `Ruleset::for_scenario` turns them into a per-run configuration.

// =============================================================================
// STARTING STATE
// =============================================================================

/// Currency every run starts with (exactly enough for the first tier 1).
pub const START_CURRENCY: f64 = 10.0;

/// Highest tier index in the reference tables.
pub const MAX_TIERS: usize = 8;

/// Lowest tier count a run may use.
pub const MIN_TIERS: usize = 4;

// =============================================================================
// RATE BOOST (item 0)
// =============================================================================

/// Price of the first rate boost.
pub const RATE_BOOST_BASE_COST: f64 = 1e3;

/// Price multiplier applied after every rate boost purchase.
pub const RATE_BOOST_COST_GROWTH: f64 = 10.0;

/// Rate multiplier before any rate boost is bought.
pub const RATE_BOOST_BASE_MULTIPLIER: f64 = 1.0;

/// Per-purchase rate multiplier growth, indexed by galaxies bought.
pub const RATE_BOOST_MULTIPLIER_GROWTH: [f64; 3] = [1.1245, 1.1445, 1.1645];

// =============================================================================
// TIERS (index 0 = tier 1)
// =============================================================================

/// Price of the first purchase of each tier.
pub const TIER_BASE_COSTS: [f64; MAX_TIERS] = [1e1, 1e2, 1e4, 1e6, 1e9, 1e13, 1e18, 1e24];

/// Price multiplier applied on every tier milestone.
pub const TIER_COST_GROWTH: [f64; MAX_TIERS] = [1e3, 1e4, 1e5, 1e6, 1e8, 1e10, 1e12, 1e15];

/// Production multiplier of each tier before bonuses.
pub const TIER_BASE_MULTIPLIERS: [f64; MAX_TIERS] = [1.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];

/// Mobile builds double every tier's base multiplier.
pub const MOBILE_TIER_MULTIPLIER: f64 = 2.0;

/// A tier milestone happens every this many purchases.
pub const MILESTONE_EVERY: u32 = 10;

/// Tier multiplier growth on each milestone.
pub const MILESTONE_MULTIPLIER: f64 = 2.0;

/// Tier multiplier per boost that covers the tier.
pub const BOOST_MULTIPLIER: f64 = 2.0;

// =============================================================================
// ACHIEVEMENT BONUSES
// =============================================================================

/// Global tier multiplier per unlocked achievement.
pub const ACHIEVEMENT_MULTIPLIER: f64 = 1.03;

/// Global tier multiplier for a completed achievement row.
pub const ACHIEVEMENT_ROW_MULTIPLIER: f64 = 1.25;

/// Achievements every scenario starts with.
pub const START_ACHIEVEMENTS: u32 = 3;

/// Top tier bonus (r23).
pub const TOP_TIER_ACHIEVEMENT_MULTIPLIER: f64 = 1.1;

/// Tier 1 bonus (r28).
pub const FIRST_TIER_ACHIEVEMENT_MULTIPLIER: f64 = 1.1;

/// Tier 1 bonus (r31).
pub const FIRST_TIER_LATE_ACHIEVEMENT_MULTIPLIER: f64 = 1.05;

// =============================================================================
// TICK DURATION
// =============================================================================

/// Seconds per tick on desktop.
pub const PC_TICK_SECONDS: f64 = 0.033;

/// Seconds per tick on mobile.
pub const MOBILE_TICK_SECONDS: f64 = 0.025;

// =============================================================================
// SACRIFICE
// =============================================================================

/// Boosts needed before the sacrifice mechanic unlocks.
pub const SACRIFICE_MIN_BOOSTS: u8 = 5;

/// Incremental ladders stop below this boost.
pub const SACRIFICE_MAX_BOOST: f64 = 50.0;

/// Default ladder step for the incremental sacrifice policy.
pub const DEFAULT_SACRIFICE_STEP: f64 = 0.001;

/// Currency ceiling reported as the target when the last galaxy requirement
/// can only be met by overflowing.
pub const OVERFLOW_TARGET_CURRENCY: f64 = 1.78e308;

// =============================================================================
// HEURISTIC SEARCH
// =============================================================================

/// Stack prices within this factor of the cheapest stack are grouped together.
pub const HEURISTIC_ACCURACY_MULTIPLIER: f64 = 1.01;

/// The last tier is forced when its stack costs below this share of the cheapest.
pub const HEURISTIC_LAST_TIER_LOW_MULTIPLIER: f64 = 0.2;

/// The last tier joins the group when its stack costs below this multiple.
pub const HEURISTIC_LAST_TIER_HIGH_MULTIPLIER: f64 = 20.0;

/// Anything costing at most currency / this is bought without branching.
pub const HEURISTIC_ALWAYS_BUY_MULTIPLIER: f64 = 1000.0;

// =============================================================================
// ENGINE CADENCE
// =============================================================================

/// Growth cycles allowed between two prunes.
pub const PRUNE_CYCLE_LIMIT: u32 = 300;

/// Pool growth factor (relative to the last prune) that forces a prune.
pub const PRUNE_GROWTH_LIMIT: f64 = 1.5;

/// Lines reserved per pool growth step.
pub const POOL_BLOCK_LINES: usize = 100_000;

/// Upper bound on controller runs for one scenario.
pub const DEFAULT_MAX_ITERATIONS: usize = 40;

// =============================================================================
// Helpers
// =============================================================================

/// Sacrifice multiplier earned by a total sacrificed amount.
///
/// `1` until the sacrificed amount reaches 1e10, then `(log10(s) / 10)^2`.
pub fn sacrifice_multiplier(sacrificed: f64) -> f64 {
    if sacrificed == 0.0 {
        return 1.0;
    }
    (sacrificed.log10() / 10.0).max(1.0).powi(2)
}

/// Boost a sacrifice would grant right now.
pub fn predicted_sacrifice_boost(sacrificed: f64, first_tier_amount: f64) -> f64 {
    sacrifice_multiplier(sacrificed + first_tier_amount) / sacrifice_multiplier(sacrificed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sacrifice_multiplier_flat_below_threshold() {
        assert_eq!(sacrifice_multiplier(0.0), 1.0);
        assert_eq!(sacrifice_multiplier(1e5), 1.0);
        assert_eq!(sacrifice_multiplier(1e10), 1.0);
    }

    #[test]
    fn test_sacrifice_multiplier_grows_after_threshold() {
        assert!((sacrifice_multiplier(1e20) - 4.0).abs() < 1e-12);
        assert!(sacrifice_multiplier(1e30) > sacrifice_multiplier(1e20));
    }

    #[test]
    fn test_predicted_boost_never_below_one() {
        assert_eq!(predicted_sacrifice_boost(0.0, 0.0), 1.0);
        assert!(predicted_sacrifice_boost(1e12, 1e15) >= 1.0);
        assert!((predicted_sacrifice_boost(0.0, 1e20) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_tables_are_consistent() {
        assert_eq!(TIER_BASE_COSTS.len(), TIER_COST_GROWTH.len());
        assert!(TIER_BASE_COSTS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(START_CURRENCY, TIER_BASE_COSTS[0]);
    }
}
