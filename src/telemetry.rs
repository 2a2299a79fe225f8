//! Run telemetry and host introspection.
//!
//! The engine and the optimizer report progress through an injected
//! [`TelemetrySink`]; nothing in the core writes to a display directly.
//! - `NoopSink`: discards everything (tests)
//! - `TracingSink`: forwards events to `tracing`

use crate::core::scenario::Scenario;
use crate::engine::result::{PhaseTimes, RunResult};
use tracing::{debug, info};

/// Emitted once when a run starts.
#[derive(Debug, Clone)]
pub struct RunStart<'a> {
    pub scenario: &'a Scenario,
    pub purchase_policy: &'a str,
    pub sacrifice_policy: &'a str,
    pub target_currency: f64,
}

/// Emitted after every prune.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneStatus {
    pub ticks: u64,
    pub game_time: f64,
    pub lines_added: usize,
    pub lines_removed: usize,
    pub live_lines: usize,
    /// Phase time spent since the previous status.
    pub phases: PhaseTimes,
    /// Simulated seconds per wall second since the previous status.
    pub speed: f64,
}

/// Receiver for run and optimizer events. Every method defaults to a no-op.
pub trait TelemetrySink {
    fn run_started(&mut self, _start: &RunStart<'_>) {}

    fn progress(&mut self, _max_currency: f64) {}

    fn prune_status(&mut self, _status: &PruneStatus) {}

    fn run_finished(&mut self, _result: &RunResult) {}

    fn iteration_started(&mut self, _index: usize, _description: &str) {}
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

/// Sink that logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn run_started(&mut self, start: &RunStart<'_>) {
        info!(
            scenario = %start.scenario,
            purchase_policy = start.purchase_policy,
            sacrifice_policy = start.sacrifice_policy,
            target_currency = start.target_currency,
            "Run started"
        );
    }

    fn progress(&mut self, max_currency: f64) {
        debug!(max_currency, "Progress");
    }

    fn prune_status(&mut self, status: &PruneStatus) {
        debug!(
            ticks = status.ticks,
            game_time = status.game_time,
            added = status.lines_added,
            removed = status.lines_removed,
            live = status.live_lines,
            tick_ms = status.phases.tick.as_millis() as u64,
            buy_ms = status.phases.buy.as_millis() as u64,
            sacrifice_ms = status.phases.sacrifice.as_millis() as u64,
            prune_ms = status.phases.prune.as_millis() as u64,
            speed = status.speed,
            "Pruned"
        );
    }

    fn run_finished(&mut self, result: &RunResult) {
        info!(
            scenario = %result.scenario,
            ticks = result.ticks,
            winners = result.winners,
            states = result.stats.states_created,
            elapsed_ms = result.stats.elapsed.as_millis() as u64,
            "Run finished"
        );
    }

    fn iteration_started(&mut self, index: usize, description: &str) {
        info!(iteration = index, description, "Iteration started");
    }
}

/// Host facts stamped into reports.
pub trait HostProbe {
    fn cpu_brand(&self) -> String;

    /// Peak resident memory of this process in MiB, `0` when unknown.
    fn peak_memory_mb(&self) -> f64;
}

/// Reads `/proc`; degrades to "unknown" and 0 where it is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcHostProbe;

impl HostProbe for ProcHostProbe {
    fn cpu_brand(&self) -> String {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|text| parse_cpu_brand(&text))
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn peak_memory_mb(&self) -> f64 {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|text| parse_peak_kib(&text))
            .map(|kib| kib as f64 / 1024.0)
            .unwrap_or(0.0)
    }
}

fn parse_cpu_brand(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, brand)| brand.trim().to_string())
}

fn parse_peak_kib(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmHWM:"))?;
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Fixed answers for tests and reproducible reports.
#[derive(Debug, Clone)]
pub struct FixedHostProbe {
    pub cpu: String,
    pub memory_mb: f64,
}

impl FixedHostProbe {
    pub fn new(cpu: impl Into<String>, memory_mb: f64) -> Self {
        Self {
            cpu: cpu.into(),
            memory_mb,
        }
    }
}

impl Default for FixedHostProbe {
    fn default() -> Self {
        Self::new("test cpu", 0.0)
    }
}

impl HostProbe for FixedHostProbe {
    fn cpu_brand(&self) -> String {
        self.cpu.clone()
    }

    fn peak_memory_mb(&self) -> f64 {
        self.memory_mb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_brand() {
        let text = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Example CPU @ 3.00GHz\n";
        assert_eq!(parse_cpu_brand(text).as_deref(), Some("Example CPU @ 3.00GHz"));
        assert_eq!(parse_cpu_brand("processor: 0\n"), None);
    }

    #[test]
    fn test_parse_peak_memory() {
        let text = "Name:\tboostline\nVmPeak:\t  20000 kB\nVmHWM:\t    2048 kB\nVmRSS:\t 1024 kB\n";
        assert_eq!(parse_peak_kib(text), Some(2048));
        assert_eq!(parse_peak_kib("Name:\tboostline\n"), None);
    }

    #[test]
    fn test_fixed_probe() {
        let probe = FixedHostProbe::new("cpu", 12.5);
        assert_eq!(probe.cpu_brand(), "cpu");
        assert_eq!(probe.peak_memory_mb(), 12.5);
    }

    #[test]
    fn test_noop_sink_accepts_events() {
        let mut sink = NoopSink;
        sink.progress(1.0);
        sink.iteration_started(1, "first");
    }
}
