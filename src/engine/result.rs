//! What a finished run hands back.

use crate::core::scenario::Scenario;
use crate::pool::{ActionHistory, LineSnapshot};
use std::time::Duration;

/// Wall time spent per engine phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimes {
    pub tick: Duration,
    pub buy: Duration,
    pub sacrifice: Duration,
    pub prune: Duration,
}

impl PhaseTimes {
    pub fn total(&self) -> Duration {
        self.tick + self.buy + self.sacrifice + self.prune
    }

    /// Time outside the measured phases.
    pub fn other(&self, elapsed: Duration) -> Duration {
        elapsed.saturating_sub(self.total())
    }

    /// Time spent since an earlier reading.
    pub fn since(&self, earlier: &PhaseTimes) -> PhaseTimes {
        PhaseTimes {
            tick: self.tick.saturating_sub(earlier.tick),
            buy: self.buy.saturating_sub(earlier.buy),
            sacrifice: self.sacrifice.saturating_sub(earlier.sacrifice),
            prune: self.prune.saturating_sub(earlier.prune),
        }
    }
}

/// Search effort behind a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Lines ever created, clones included.
    pub states_created: u64,
    pub elapsed: Duration,
    pub phases: PhaseTimes,
    pub peak_memory_mb: f64,
    pub cpu: String,
}

/// Terminal snapshot of the winning line of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub scenario: Scenario,
    pub tick_duration: f64,
    pub ticks: u64,
    /// The run allowed sacrifices.
    pub sacrifice_enabled: bool,
    pub purchase_policy: String,
    pub sacrifice_policy: String,
    pub sacrifice_step: f64,
    /// Lines that met the win condition on the final tick.
    pub winners: usize,
    /// The run ended through the overflow path.
    pub overflowed: bool,
    pub winner: LineSnapshot,
    pub stats: SearchStats,
}

impl RunResult {
    /// Simulated seconds until the win.
    pub fn game_time(&self) -> f64 {
        self.ticks as f64 * self.tick_duration
    }

    pub fn history(&self) -> &ActionHistory {
        &self.winner.history
    }

    pub fn used_sacrifice(&self) -> bool {
        !self.winner.history.sacrifice_boosts().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_time_never_negative() {
        let phases = PhaseTimes {
            tick: Duration::from_millis(40),
            buy: Duration::from_millis(30),
            sacrifice: Duration::ZERO,
            prune: Duration::from_millis(10),
        };
        assert_eq!(phases.total(), Duration::from_millis(80));
        assert_eq!(phases.other(Duration::from_millis(100)), Duration::from_millis(20));
        assert_eq!(phases.other(Duration::from_millis(50)), Duration::ZERO);
    }

    #[test]
    fn test_since_subtracts_per_phase() {
        let earlier = PhaseTimes {
            tick: Duration::from_millis(5),
            ..PhaseTimes::default()
        };
        let later = PhaseTimes {
            tick: Duration::from_millis(8),
            buy: Duration::from_millis(2),
            ..PhaseTimes::default()
        };
        let delta = later.since(&earlier);
        assert_eq!(delta.tick, Duration::from_millis(3));
        assert_eq!(delta.buy, Duration::from_millis(2));
    }
}
