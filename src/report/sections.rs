//! JSON sections of a report.

use super::time::{format_share, format_time, parse_time};
use crate::build_info::{BUILD_COMMIT, BUILD_DATE};
use crate::core::scenario::{Platform, Scenario};
use crate::engine::RunResult;
use serde::{Deserialize, Serialize};

/// `GAME INFO`: what was simulated and how long the winner took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub platform: Platform,
    pub galaxies: u8,
    pub boosts: u8,
    pub has_sacrifice: bool,
    pub game_time: String,
    pub ticks_passed: u64,
    pub tick_duration: f64,
}

impl GameInfo {
    pub fn from_run(result: &RunResult) -> Self {
        Self {
            platform: result.scenario.platform,
            galaxies: result.scenario.galaxies,
            boosts: result.scenario.boosts,
            has_sacrifice: result.sacrifice_enabled,
            game_time: format_time(result.game_time()),
            ticks_passed: result.ticks,
            tick_duration: result.tick_duration,
        }
    }

    pub fn scenario(&self) -> Scenario {
        Scenario::new(self.platform, self.galaxies, self.boosts)
    }

    /// Simulated seconds, read back from the formatted game time.
    pub fn game_seconds(&self) -> Option<f64> {
        parse_time(&self.game_time)
    }
}

/// Wall time per engine phase with its share of the whole search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub tick: String,
    pub buy: String,
    pub sacrifice: String,
    pub prune: String,
    pub other: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStamp {
    pub commit: String,
    pub date: String,
}

impl BuildStamp {
    pub fn current() -> Self {
        Self {
            commit: BUILD_COMMIT.to_string(),
            date: BUILD_DATE.to_string(),
        }
    }
}

/// `STRATEGY SEARCH INFO`: how the winner of a single run was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySearchInfo {
    pub purchase_policy: String,
    pub sacrifice_policy: String,
    pub sacrifice_step: f64,
    pub strategy_search_time: String,
    pub cpu: String,
    pub used_memory_mb: f64,
    pub states_analyzed: u64,
    pub number_of_winners: usize,
    pub time_breakdown: TimeBreakdown,
    pub build: BuildStamp,
}

impl StrategySearchInfo {
    pub fn from_run(result: &RunResult) -> Self {
        let stats = &result.stats;
        let total = stats.elapsed.as_secs_f64();
        let share = |phase: std::time::Duration| format_share(phase.as_secs_f64(), total);
        Self {
            purchase_policy: result.purchase_policy.clone(),
            sacrifice_policy: result.sacrifice_policy.clone(),
            sacrifice_step: result.sacrifice_step,
            strategy_search_time: format_time(total),
            cpu: stats.cpu.clone(),
            used_memory_mb: (stats.peak_memory_mb * 1000.0).round() / 1000.0,
            states_analyzed: stats.states_created,
            number_of_winners: result.winners,
            time_breakdown: TimeBreakdown {
                tick: share(stats.phases.tick),
                buy: share(stats.phases.buy),
                sacrifice: share(stats.phases.sacrifice),
                prune: share(stats.phases.prune),
                other: share(stats.phases.other(stats.elapsed)),
            },
            build: BuildStamp::current(),
        }
    }
}

/// One run of an optimization session, without its actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationInfo {
    pub description: String,
    pub game_info: GameInfo,
    pub strategy_search_info: StrategySearchInfo,
}

/// `ITERATIVE OPTIMIZATION INFO`: every run of a session plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterativeOptimizationInfo {
    pub total_strategy_search_time: String,
    pub cpu: String,
    pub max_used_memory_mb: f64,
    pub total_states_analyzed: u64,
    pub number_of_iterations: usize,
    pub iterations: Vec<IterationInfo>,
}

impl IterativeOptimizationInfo {
    pub fn new(cpu: impl Into<String>) -> Self {
        Self {
            total_strategy_search_time: format_time(0.0),
            cpu: cpu.into(),
            max_used_memory_mb: 0.0,
            total_states_analyzed: 0,
            number_of_iterations: 0,
            iterations: Vec::new(),
        }
    }

    /// Append a run and fold it into the totals.
    ///
    /// The total search time is the sum of the already truncated per-run
    /// times, so it always matches what a reader adds up by hand.
    pub fn push(&mut self, iteration: IterationInfo) {
        let search = &iteration.strategy_search_info;
        let total = parse_time(&self.total_strategy_search_time).unwrap_or(0.0)
            + parse_time(&search.strategy_search_time).unwrap_or(0.0);
        self.total_strategy_search_time = format_time(total);
        self.max_used_memory_mb = self.max_used_memory_mb.max(search.used_memory_mb);
        self.total_states_analyzed += search.states_analyzed;
        self.number_of_iterations += 1;
        self.iterations.push(iteration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PhaseTimes, SearchStats};
    use crate::pool::{ActionHistory, LineSnapshot, PurchaseQueue, SacrificeQueue};
    use std::time::Duration;

    fn run_result() -> RunResult {
        RunResult {
            scenario: Scenario::new(Platform::Mobile, 0, 5),
            tick_duration: 0.025,
            ticks: 4000,
            sacrifice_enabled: true,
            purchase_policy: "HeuristicSearch".to_string(),
            sacrifice_policy: "IncrementalSacrifice".to_string(),
            sacrifice_step: 0.001,
            winners: 3,
            overflowed: false,
            winner: LineSnapshot {
                currency: 1.0,
                tier_amounts: vec![0.0; 8],
                sacrificed: 0.0,
                purchase_counts: vec![0; 9],
                costs: vec![1.0; 9],
                multipliers: vec![1.0; 9],
                history: ActionHistory::new(),
                purchase_queue: PurchaseQueue::default(),
                sacrifice_queue: SacrificeQueue::empty(),
            },
            stats: SearchStats {
                states_created: 1234,
                elapsed: Duration::from_millis(2000),
                phases: PhaseTimes {
                    tick: Duration::from_millis(1000),
                    buy: Duration::from_millis(500),
                    sacrifice: Duration::from_millis(250),
                    prune: Duration::from_millis(50),
                },
                peak_memory_mb: 12.34567,
                cpu: "test cpu".to_string(),
            },
        }
    }

    #[test]
    fn test_game_info_from_run() {
        let info = GameInfo::from_run(&run_result());
        assert_eq!(info.game_time, "01:40.000");
        assert_eq!(info.ticks_passed, 4000);
        assert!(info.has_sacrifice);
        assert_eq!(info.scenario(), Scenario::new(Platform::Mobile, 0, 5));
        assert_eq!(info.game_seconds(), Some(100.0));
    }

    #[test]
    fn test_search_info_breakdown() {
        let info = StrategySearchInfo::from_run(&run_result());
        assert_eq!(info.strategy_search_time, "00:02.000");
        assert_eq!(info.used_memory_mb, 12.346);
        assert_eq!(info.time_breakdown.tick, "00:01.000 (50%)");
        assert_eq!(info.time_breakdown.sacrifice, "00:00.250 (12%)");
        assert_eq!(info.time_breakdown.other, "00:00.200 (10%)");
        assert_eq!(info.build.commit, BUILD_COMMIT);
    }

    #[test]
    fn test_game_info_json_keys() {
        let json = serde_json::to_value(GameInfo::from_run(&run_result())).unwrap();
        assert_eq!(json["platform"], "mobile");
        assert_eq!(json["boosts"], 5);
        assert_eq!(json["ticks_passed"], 4000);
    }

    #[test]
    fn test_iterations_fold_into_totals() {
        let run = run_result();
        let iteration = IterationInfo {
            description: "first".to_string(),
            game_info: GameInfo::from_run(&run),
            strategy_search_info: StrategySearchInfo::from_run(&run),
        };
        let mut info = IterativeOptimizationInfo::new("test cpu");
        info.push(iteration.clone());
        info.push(iteration);
        assert_eq!(info.number_of_iterations, 2);
        assert_eq!(info.total_states_analyzed, 2468);
        assert_eq!(info.total_strategy_search_time, "00:04.000");
        assert_eq!(info.max_used_memory_mb, 12.346);
    }
}
