//! Decision policies queried by the engine after every state change.
//!
//! A policy is a pure function of one line's state and the run's ruleset.
//! Calling it twice on an unchanged line returns the same queue.

pub mod purchase;
pub mod sacrifice;

pub use purchase::{ExhaustiveSearch, FixedOrder, FixedPriority, HeuristicSearch, ReplayPurchases};
pub use sacrifice::{IncrementalSacrifice, NeverSacrifice, ReplaySacrifices};

use crate::core::ruleset::Ruleset;
use crate::pool::{LineView, PurchaseQueue, SacrificeQueue};

/// Orders the purchases a line may make next.
pub trait PurchasePolicy {
    /// Name written to reports.
    fn name(&self) -> &str;

    /// Directory name for persisted results.
    fn short_name(&self) -> &str;

    /// Human readable rules, one per line.
    fn description(&self) -> Vec<String> {
        vec![self.name().to_string()]
    }

    /// Whether the policy never branches, so refining purchases is pointless.
    fn is_fixed_order(&self) -> bool {
        false
    }

    /// Admissible purchases, best first. More than one entry forks the line.
    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue;
}

/// Orders the sacrifice boosts a line waits for.
pub trait SacrificePolicy {
    fn name(&self) -> &str;

    /// Whether the engine should consider sacrifices at all.
    fn is_active(&self) -> bool;

    /// Ladder step, `0` for policies without one.
    fn step(&self) -> f64 {
        0.0
    }

    /// Ascending boost thresholds; an empty queue never sacrifices.
    fn next_sacrifices(&self, line: &LineView<'_>, rules: &Ruleset) -> SacrificeQueue;
}

/// Purchase policies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    Exhaustive,
    Heuristic,
    #[value(name = "T12345678")]
    RateFirst,
    #[value(name = "12T345678")]
    LowTiersFirst,
    #[value(name = "T87654321")]
    RateThenHighTiers,
    #[value(name = "87654321T")]
    HighTiersFirst,
    #[value(name = "12345678T")]
    RateLast,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn PurchasePolicy> {
        match self {
            PolicyKind::Exhaustive => Box::new(ExhaustiveSearch),
            PolicyKind::Heuristic => Box::new(HeuristicSearch),
            PolicyKind::RateFirst => Box::new(FixedPriority::new(FixedOrder::RateFirst)),
            PolicyKind::LowTiersFirst => Box::new(FixedPriority::new(FixedOrder::LowTiersFirst)),
            PolicyKind::RateThenHighTiers => {
                Box::new(FixedPriority::new(FixedOrder::RateThenHighTiers))
            }
            PolicyKind::HighTiersFirst => Box::new(FixedPriority::new(FixedOrder::HighTiersFirst)),
            PolicyKind::RateLast => Box::new(FixedPriority::new(FixedOrder::RateLast)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kinds_build_matching_policies() {
        assert_eq!(PolicyKind::Heuristic.build().short_name(), "heuristic");
        assert!(!PolicyKind::Exhaustive.build().is_fixed_order());
        let fixed = PolicyKind::LowTiersFirst.build();
        assert!(fixed.is_fixed_order());
        assert_eq!(fixed.short_name(), "12T345678");
    }
}
