//! Per-run configuration injected into the engine.
//!
//! A `Ruleset` is pure data. The reference variant is derived from a
//! [`Scenario`] with [`Ruleset::for_scenario`]; tests and callers may also
//! build one by hand and check it with [`Ruleset::validate`].

use crate::core::balance::*;
use crate::core::item::Item;
use crate::core::scenario::{last_boost, Platform, Scenario};
use crate::error::ConfigError;

/// Static per-variant constants for one run.
///
/// Per-item tables have `tiers + 1` entries: index 0 is the rate boost,
/// index `t` is tier `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruleset {
    pub scenario: Scenario,
    pub tiers: usize,
    pub tick_duration: f64,
    pub start_currency: f64,
    /// Price of the first purchase of each item.
    pub base_costs: Vec<f64>,
    /// Price growth: per purchase for the rate boost, per milestone for tiers.
    pub cost_growth: Vec<f64>,
    /// Starting multipliers with every start bonus applied.
    pub base_multipliers: Vec<f64>,
    /// Rate multiplier growth per rate boost purchase.
    pub rate_multiplier_growth: f64,
    pub milestone_every: u32,
    pub milestone_multiplier: f64,
    /// Factor applied to every tier multiplier when a tier is first bought.
    /// `1.0` means no bonus; index 0 is unused.
    pub first_purchase_bonus: Vec<f64>,
    /// Top tier purchases that win the run.
    pub win_threshold: u32,
    /// Whether sacrifices may happen at all in this run.
    pub sacrifice_enabled: bool,
}

impl Ruleset {
    /// Build and validate the reference ruleset for a scenario.
    pub fn for_scenario(scenario: &Scenario) -> Result<Self, ConfigError> {
        let last = last_boost(scenario.galaxies).ok_or(ConfigError::UnsupportedGalaxies {
            galaxies: scenario.galaxies,
        })?;
        if scenario.boosts > last {
            return Err(ConfigError::BoostsOutOfRange {
                boosts: scenario.boosts,
                galaxies: scenario.galaxies,
                last,
            });
        }

        let tiers = scenario.active_tiers();
        let mut base_costs = vec![RATE_BOOST_BASE_COST];
        base_costs.extend_from_slice(&TIER_BASE_COSTS[..tiers]);
        let mut cost_growth = vec![RATE_BOOST_COST_GROWTH];
        cost_growth.extend_from_slice(&TIER_COST_GROWTH[..tiers]);

        let mut base_multipliers = vec![RATE_BOOST_BASE_MULTIPLIER];
        for tier in 1..=tiers {
            let mut multiplier = TIER_BASE_MULTIPLIERS[tier - 1];
            if scenario.platform == Platform::Mobile {
                multiplier *= MOBILE_TIER_MULTIPLIER;
            }
            base_multipliers.push(multiplier);
        }
        apply_start_bonuses(scenario, &mut base_multipliers);

        let ruleset = Self {
            scenario: *scenario,
            tiers,
            tick_duration: scenario.platform.tick_duration(),
            start_currency: START_CURRENCY,
            base_costs,
            cost_growth,
            base_multipliers,
            rate_multiplier_growth: RATE_BOOST_MULTIPLIER_GROWTH[scenario.galaxies as usize],
            milestone_every: MILESTONE_EVERY,
            milestone_multiplier: MILESTONE_MULTIPLIER,
            first_purchase_bonus: first_purchase_bonuses(scenario, tiers),
            win_threshold: scenario.win_threshold(),
            sacrifice_enabled: scenario.has_sacrifice(),
        };
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Check every table before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIERS..=MAX_TIERS).contains(&self.tiers) {
            return Err(ConfigError::TierCount { tiers: self.tiers });
        }
        let expected = self.tiers + 1;
        for (table, actual) in [
            ("base_costs", self.base_costs.len()),
            ("cost_growth", self.cost_growth.len()),
            ("base_multipliers", self.base_multipliers.len()),
            ("first_purchase_bonus", self.first_purchase_bonus.len()),
        ] {
            if actual != expected {
                return Err(ConfigError::TableLength {
                    table,
                    expected,
                    actual,
                });
            }
        }

        positive("tick_duration", self.tick_duration)?;
        positive("rate_multiplier_growth", self.rate_multiplier_growth)?;
        positive("milestone_multiplier", self.milestone_multiplier)?;
        for value in self
            .base_costs
            .iter()
            .chain(&self.cost_growth)
            .copied()
        {
            positive("cost", value)?;
        }
        for value in self.base_multipliers.iter().copied() {
            positive("multiplier", value)?;
        }
        for value in self.first_purchase_bonus.iter().copied() {
            positive("first_purchase_bonus", value)?;
        }
        if !self.start_currency.is_finite() || self.start_currency < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "start_currency",
                value: self.start_currency,
            });
        }
        if self.milestone_every == 0 {
            return Err(ConfigError::NonPositive {
                field: "milestone_every",
                value: 0.0,
            });
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::UnreachableWin);
        }
        Ok(())
    }

    pub fn top_tier(&self) -> Item {
        Item::Tier(self.tiers as u8)
    }

    /// Currency needed for the winning top tier purchase. Progress display only.
    pub fn target_currency(&self) -> f64 {
        if self.tiers == MAX_TIERS && self.win_threshold >= 200 {
            return OVERFLOW_TARGET_CURRENCY;
        }
        let top = self.tiers;
        let (raises, last_batch) = if self.win_threshold % self.milestone_every == 0 {
            (self.win_threshold / self.milestone_every - 1, self.milestone_every)
        } else {
            (
                self.win_threshold / self.milestone_every,
                self.win_threshold % self.milestone_every,
            )
        };
        self.base_costs[top] * self.cost_growth[top].powi(raises as i32) * last_batch as f64
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Achievement, row and boost multipliers owned at scenario start.
fn apply_start_bonuses(scenario: &Scenario, multipliers: &mut [f64]) {
    let tiers = multipliers.len() - 1;
    let achievement = ACHIEVEMENT_MULTIPLIER.powi(scenario.start_achievements() as i32);
    for multiplier in multipliers.iter_mut().skip(1) {
        *multiplier *= achievement;
    }

    let (galaxies, boosts) = (scenario.galaxies, scenario.boosts);
    if (galaxies == 0 && boosts >= 5) || galaxies >= 1 {
        for multiplier in multipliers.iter_mut().skip(1) {
            *multiplier *= ACHIEVEMENT_ROW_MULTIPLIER;
        }
    }
    if ((galaxies == 1 && boosts >= 10) || galaxies >= 2) && tiers >= 8 {
        multipliers[8] *= TOP_TIER_ACHIEVEMENT_MULTIPLIER;
    }
    if (galaxies == 1 && boosts >= 12) || galaxies >= 2 {
        multipliers[1] *= FIRST_TIER_ACHIEVEMENT_MULTIPLIER;
    }
    if galaxies == 2 && boosts >= 15 {
        multipliers[1] *= FIRST_TIER_LATE_ACHIEVEMENT_MULTIPLIER;
    }

    for (tier, multiplier) in multipliers.iter_mut().enumerate().skip(1) {
        let covering = (boosts as i32 - tier as i32 + 1).max(0);
        if covering > 0 {
            *multiplier *= BOOST_MULTIPLIER.powi(covering);
        }
    }
}

/// One-time bonuses for the first purchase of each tier.
fn first_purchase_bonuses(scenario: &Scenario, tiers: usize) -> Vec<f64> {
    let mut bonus = vec![1.0; tiers + 1];
    if scenario.galaxies != 0 {
        return bonus;
    }
    match scenario.boosts {
        0 => {
            for value in bonus.iter_mut().skip(1) {
                *value = ACHIEVEMENT_MULTIPLIER;
            }
        }
        b @ 1..=4 => {
            let unlocked = 4 + b as usize;
            bonus[unlocked] = ACHIEVEMENT_MULTIPLIER;
            if b == 4 {
                bonus[unlocked] *= ACHIEVEMENT_ROW_MULTIPLIER;
            }
        }
        _ => {}
    }
    bonus
}
