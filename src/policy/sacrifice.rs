//! Sacrifice policies: the boost thresholds at which a line sacrifices.

use super::SacrificePolicy;
use crate::core::balance::SACRIFICE_MAX_BOOST;
use crate::core::ruleset::Ruleset;
use crate::error::{ConfigError, ReportParseError};
use crate::pool::{LineView, SacrificeQueue};
use crate::report::Report;
use std::sync::Arc;

/// Sacrifice is never used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSacrifice;

impl SacrificePolicy for NeverSacrifice {
    fn name(&self) -> &str {
        "NeverSacrifice"
    }

    fn is_active(&self) -> bool {
        false
    }

    fn next_sacrifices(&self, _line: &LineView<'_>, _rules: &Ruleset) -> SacrificeQueue {
        SacrificeQueue::empty()
    }
}

/// Offers every boost `1 + k·step` below the ladder cap, then a hold
/// threshold that is never met.
///
/// The ladder is built once and shared by every line.
#[derive(Debug, Clone)]
pub struct IncrementalSacrifice {
    step: f64,
    ladder: Arc<[f64]>,
}

impl IncrementalSacrifice {
    pub fn new(step: f64) -> Result<Self, ConfigError> {
        if !step.is_finite() || step <= 0.0 || step >= SACRIFICE_MAX_BOOST - 1.0 {
            return Err(ConfigError::InvalidSacrificeStep { step });
        }
        let count = ((SACRIFICE_MAX_BOOST - 1.0) / step) as usize;
        let mut ladder: Vec<f64> = (1..=count)
            .map(|k| 1.0 + k as f64 * step)
            .take_while(|&boost| boost < SACRIFICE_MAX_BOOST)
            .collect();
        ladder.push(f64::INFINITY);
        Ok(Self {
            step,
            ladder: Arc::from(ladder),
        })
    }

    pub fn ladder(&self) -> &[f64] {
        &self.ladder
    }
}

impl SacrificePolicy for IncrementalSacrifice {
    fn name(&self) -> &str {
        "IncrementalSacrifice"
    }

    fn is_active(&self) -> bool {
        true
    }

    fn step(&self) -> f64 {
        self.step
    }

    fn next_sacrifices(&self, _line: &LineView<'_>, _rules: &Ruleset) -> SacrificeQueue {
        SacrificeQueue::new(Arc::clone(&self.ladder))
    }
}

/// Replays recorded sacrifice boosts in order.
///
/// The next threshold is rescaled by how far the boosts realized so far
/// drifted from the recorded ones, so the compounded total stays on track.
/// Once the list is used up the line holds forever.
#[derive(Debug, Clone, Default)]
pub struct ReplaySacrifices {
    boosts: Vec<f64>,
}

impl ReplaySacrifices {
    pub fn new(boosts: Vec<f64>) -> Self {
        Self { boosts }
    }

    pub fn from_report(report: &Report) -> Result<Self, ReportParseError> {
        Ok(Self::new(report.parsed_actions()?.sacrifices))
    }

    pub fn len(&self) -> usize {
        self.boosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boosts.is_empty()
    }

    /// Threshold for the sacrifice following `realized`, if one is left.
    pub fn calibrated_next(&self, realized: &[f64]) -> Option<f64> {
        let done = realized.len();
        let next = *self.boosts.get(done)?;
        let predicted: f64 = self.boosts[..done].iter().product();
        let actual: f64 = realized.iter().product();
        Some(next * predicted / actual)
    }
}

impl SacrificePolicy for ReplaySacrifices {
    fn name(&self) -> &str {
        "ReplaySacrifices"
    }

    fn is_active(&self) -> bool {
        true
    }

    fn next_sacrifices(&self, line: &LineView<'_>, _rules: &Ruleset) -> SacrificeQueue {
        let realized = line.history().sacrifice_boosts();
        let threshold = self.calibrated_next(&realized).unwrap_or(f64::INFINITY);
        SacrificeQueue::from_thresholds(vec![threshold])
    }
}
