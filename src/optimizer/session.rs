//! Ordered runs of one optimization session.

use crate::core::scenario::Scenario;
use crate::engine::RunResult;
use crate::report::{
    GameInfo, IterationInfo, IterativeOptimizationInfo, Report, StrategySearchInfo,
};
use std::time::Duration;

/// One finished run and why it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRun {
    pub description: String,
    pub result: RunResult,
}

/// Why a session took no further runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The scenario has no sacrifice, one run is all there is.
    NoSacrifice,
    /// A fixed-order policy ignores replayed sacrifices.
    FixedOrder,
    /// A refinement cycle failed to beat the run before it.
    Converged,
    /// Another cycle would exceed `max_iterations`.
    IterationCap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSession {
    scenario: Scenario,
    cpu: String,
    runs: Vec<SessionRun>,
    stop_reason: Option<StopReason>,
}

impl OptimizationSession {
    pub fn new(scenario: Scenario, cpu: impl Into<String>) -> Self {
        Self {
            scenario,
            cpu: cpu.into(),
            runs: Vec::new(),
            stop_reason: None,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn push(&mut self, description: impl Into<String>, result: RunResult) {
        self.runs.push(SessionRun {
            description: description.into(),
            result,
        });
    }

    pub fn finish(&mut self, reason: StopReason) {
        self.stop_reason = Some(reason);
    }

    /// `None` while the session is still taking runs.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn runs(&self) -> &[SessionRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn last(&self) -> Option<&SessionRun> {
        self.runs.last()
    }

    /// Tick counts in run order.
    pub fn ticks(&self) -> Vec<u64> {
        self.runs.iter().map(|run| run.result.ticks).collect()
    }

    /// The run whose result stands for the session.
    ///
    /// A lone run stands for itself and the second run supersedes the
    /// first. A converged session ends on a cycle that failed to improve,
    /// so the run before that cycle stands. Otherwise the fewest ticks
    /// after the initial run win, the later run on a tie.
    pub fn winner(&self) -> Option<&SessionRun> {
        match self.runs.len() {
            0 => None,
            1 => self.runs.first(),
            n if n >= 3 && self.converged() => self.runs.get(n - 3),
            _ => self.runs[1..].iter().rev().min_by_key(|run| run.result.ticks),
        }
    }

    /// The last refinement cycle did not beat the run before it.
    pub fn converged(&self) -> bool {
        let n = self.runs.len();
        n >= 3 && self.runs[n - 1].result.ticks >= self.runs[n - 3].result.ticks
    }

    pub fn total_search_time(&self) -> Duration {
        self.runs.iter().map(|run| run.result.stats.elapsed).sum()
    }

    pub fn total_states(&self) -> u64 {
        self.runs.iter().map(|run| run.result.stats.states_created).sum()
    }

    pub fn peak_memory_mb(&self) -> f64 {
        self.runs
            .iter()
            .map(|run| run.result.stats.peak_memory_mb)
            .fold(0.0, f64::max)
    }

    /// Every run as an `ITERATIVE OPTIMIZATION INFO` entry.
    pub fn info(&self) -> IterativeOptimizationInfo {
        let mut info = IterativeOptimizationInfo::new(self.cpu.clone());
        for run in &self.runs {
            info.push(IterationInfo {
                description: run.description.clone(),
                game_info: GameInfo::from_run(&run.result),
                strategy_search_info: StrategySearchInfo::from_run(&run.result),
            });
        }
        info
    }

    /// Report of the session winner. A single run reports on its own.
    pub fn report(&self) -> Option<Report> {
        let winner = self.winner()?;
        if self.runs.len() == 1 {
            return Some(Report::single(&winner.result));
        }
        Some(Report::iterative(&winner.result, self.info()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scenario::Platform;
    use crate::engine::{PhaseTimes, SearchStats};
    use crate::pool::{ActionHistory, LineSnapshot, PurchaseQueue, SacrificeQueue};
    use crate::report::SearchInfo;

    fn result(ticks: u64, states: u64) -> RunResult {
        RunResult {
            scenario: Scenario::new(Platform::Pc, 0, 5),
            tick_duration: 0.033,
            ticks,
            sacrifice_enabled: false,
            purchase_policy: "HeuristicSearch".to_string(),
            sacrifice_policy: "NeverSacrifice".to_string(),
            sacrifice_step: 0.0,
            winners: 1,
            overflowed: false,
            winner: LineSnapshot {
                currency: 0.0,
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
                states_created: states,
                elapsed: Duration::from_millis(500),
                phases: PhaseTimes::default(),
                peak_memory_mb: states as f64,
                cpu: "test cpu".to_string(),
            },
        }
    }

    fn session(ticks: &[u64]) -> OptimizationSession {
        let mut session = OptimizationSession::new(Scenario::new(Platform::Pc, 0, 5), "test cpu");
        for (index, &t) in ticks.iter().enumerate() {
            session.push(format!("run {index}"), result(t, index as u64 + 1));
        }
        session
    }

    #[test]
    fn test_winner_rule() {
        assert!(session(&[]).winner().is_none());
        assert_eq!(session(&[100]).winner().unwrap().result.ticks, 100);
        assert_eq!(session(&[100, 90]).winner().unwrap().result.ticks, 90);
        let full = session(&[100, 90, 85, 80, 85, 80]);
        assert_eq!(full.winner().unwrap().description, "run 3");
    }

    #[test]
    fn test_capped_session_keeps_its_best_run() {
        // still improving when the cap hit
        let capped = session(&[100, 90, 85, 80]);
        assert!(!capped.converged());
        assert_eq!(capped.winner().unwrap().result.ticks, 80);
        assert_eq!(capped.winner().unwrap().description, "run 3");

        let tied = session(&[100, 85, 95, 90, 92, 85]);
        assert!(!tied.converged());
        assert_eq!(tied.winner().unwrap().description, "run 5");

        // the run without sacrifice never stands once another exists
        let worse = session(&[80, 90]);
        assert_eq!(worse.winner().unwrap().description, "run 1");
    }

    #[test]
    fn test_stop_reason_is_recorded() {
        let mut session = session(&[100, 90]);
        assert_eq!(session.stop_reason(), None);
        session.finish(StopReason::IterationCap);
        assert_eq!(session.stop_reason(), Some(StopReason::IterationCap));
    }

    #[test]
    fn test_converged_compares_two_back() {
        assert!(!session(&[100, 90]).converged());
        assert!(!session(&[100, 90, 85, 80]).converged());
        assert!(session(&[100, 90, 85, 90]).converged());
        assert!(session(&[100, 90, 85, 80, 85, 80]).converged());
    }

    #[test]
    fn test_totals() {
        let session = session(&[100, 90, 85, 80]);
        assert_eq!(session.total_search_time(), Duration::from_millis(2000));
        assert_eq!(session.total_states(), 10);
        assert_eq!(session.peak_memory_mb(), 4.0);
        let info = session.info();
        assert_eq!(info.number_of_iterations, 4);
        assert_eq!(info.total_strategy_search_time, "00:02.000");
        assert_eq!(info.iterations[2].description, "run 2");
    }

    #[test]
    fn test_report_kind_follows_run_count() {
        let single = session(&[100]).report().unwrap();
        assert!(matches!(single.search, SearchInfo::Single(_)));
        let iterative = session(&[100, 90]).report().unwrap();
        assert!(matches!(iterative.search, SearchInfo::Iterative(_)));
        assert_eq!(iterative.game_info.ticks_passed, 90);
    }
}
