//! Alternating refinement of purchase order and sacrifice timing.
//!
//! The controller runs the engine several times for one scenario:
//! 1. the chosen purchase policy, no sacrifices
//! 2. the first run's purchases replayed, incremental sacrifices
//! 3. then pairs of runs: the chosen policy with the last sacrifices
//!    replayed, and the last purchases replayed with incremental sacrifices
//!
//! Pairs stop once a pair fails to beat the run before it, or when the
//! iteration cap is reached.

pub mod session;
pub mod sweep;

pub use session::{OptimizationSession, SessionRun, StopReason};
pub use sweep::{sweep, SweepPlan};

use crate::core::balance::{DEFAULT_MAX_ITERATIONS, DEFAULT_SACRIFICE_STEP};
use crate::core::ruleset::Ruleset;
use crate::core::scenario::Scenario;
use crate::engine::{EngineLimits, RunResult, SimulationEngine};
use crate::error::{ConfigError, Result};
use crate::policy::{
    IncrementalSacrifice, NeverSacrifice, PurchasePolicy, ReplayPurchases, ReplaySacrifices,
    SacrificePolicy,
};
use crate::report::{format_actions, ParsedActions, ReportStore};
use crate::telemetry::{HostProbe, TelemetrySink};
use tracing::{info, warn};

pub const INITIAL_RUN: &str = "Initial run without sacrifice";
pub const INITIAL_SACRIFICE_RUN: &str = "Initial run with incremental sacrifice";
pub const FIXED_SACRIFICES_RUN: &str = "Attempt to improve - fixed sacrifices";
pub const FIXED_PURCHASES_RUN: &str = "Attempt to improve - fixed purchases";

/// Runs the two initial runs always take.
const INITIAL_RUNS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub rules: Ruleset,
    pub sacrifice_step: f64,
    /// Most engine runs one session may take.
    pub max_iterations: usize,
    pub limits: EngineLimits,
}

impl OptimizerConfig {
    /// Reference ruleset for a scenario with default step, cap and limits.
    pub fn for_scenario(scenario: &Scenario) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            rules: Ruleset::for_scenario(scenario)?,
            sacrifice_step: DEFAULT_SACRIFICE_STEP,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            limits: EngineLimits::default(),
        })
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.rules.validate()?;
        IncrementalSacrifice::new(self.sacrifice_step)?;
        if self.max_iterations < INITIAL_RUNS {
            return Err(ConfigError::IterationCap {
                max_iterations: self.max_iterations,
            });
        }
        Ok(())
    }
}

pub struct ConvergenceController<'a> {
    config: OptimizerConfig,
    policy: &'a dyn PurchasePolicy,
    host: &'a dyn HostProbe,
    store: Option<ReportStore>,
}

impl<'a> ConvergenceController<'a> {
    pub fn new(
        config: OptimizerConfig,
        policy: &'a dyn PurchasePolicy,
        host: &'a dyn HostProbe,
    ) -> Self {
        Self {
            config,
            policy,
            host,
            store: None,
        }
    }

    /// Persist the session report after the first run and at the end.
    pub fn with_store(mut self, store: ReportStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn run(&self, telemetry: &mut dyn TelemetrySink) -> Result<OptimizationSession> {
        self.config.validate()?;
        let scenario = self.config.rules.scenario;
        let mut session = OptimizationSession::new(scenario, self.host.cpu_brand());
        info!(
            scenario = %scenario,
            policy = self.policy.name(),
            max_iterations = self.config.max_iterations,
            "Optimization started"
        );

        self.run_once(&mut session, INITIAL_RUN, self.policy, &NeverSacrifice, telemetry)?;
        self.persist(&session)?;
        if !scenario.has_sacrifice() {
            session.finish(StopReason::NoSacrifice);
            return Ok(session);
        }

        let incremental = IncrementalSacrifice::new(self.config.sacrifice_step)?;
        let replay = ReplayPurchases::new(last_actions(&session)?.purchases);
        self.run_once(&mut session, INITIAL_SACRIFICE_RUN, &replay, &incremental, telemetry)?;

        if self.policy.is_fixed_order() {
            session.finish(StopReason::FixedOrder);
        } else {
            loop {
                if session.len() + 2 > self.config.max_iterations {
                    warn!(
                        scenario = %scenario,
                        runs = session.len(),
                        max_iterations = self.config.max_iterations,
                        "Iteration cap reached before convergence"
                    );
                    session.finish(StopReason::IterationCap);
                    break;
                }

                let sacrifices = ReplaySacrifices::new(last_actions(&session)?.sacrifices);
                self.run_once(&mut session, FIXED_SACRIFICES_RUN, self.policy, &sacrifices, telemetry)?;

                let purchases = ReplayPurchases::new(last_actions(&session)?.purchases);
                self.run_once(&mut session, FIXED_PURCHASES_RUN, &purchases, &incremental, telemetry)?;

                if session.converged() {
                    session.finish(StopReason::Converged);
                    break;
                }
            }
        }

        self.persist(&session)?;
        if let Some(winner) = session.winner() {
            info!(
                scenario = %scenario,
                runs = session.len(),
                ticks = winner.result.ticks,
                stop = ?session.stop_reason(),
                "Optimization finished"
            );
        }
        Ok(session)
    }

    fn run_once(
        &self,
        session: &mut OptimizationSession,
        description: &str,
        purchase: &dyn PurchasePolicy,
        sacrifice: &dyn SacrificePolicy,
        telemetry: &mut dyn TelemetrySink,
    ) -> Result<()> {
        telemetry.iteration_started(session.len() + 1, description);
        let engine = SimulationEngine::with_limits(
            self.config.rules.clone(),
            purchase,
            sacrifice,
            self.config.limits,
        )?;
        let result = engine.run(telemetry, self.host)?;
        session.push(description, result);
        Ok(())
    }

    fn persist(&self, session: &OptimizationSession) -> Result<()> {
        let (Some(store), Some(report)) = (&self.store, session.report()) else {
            return Ok(());
        };
        store.save(self.policy.short_name(), &report)?;
        Ok(())
    }
}

/// Actions of the latest run, read back through the report format.
fn last_actions(session: &OptimizationSession) -> Result<ParsedActions> {
    match session.last() {
        Some(run) => replay_actions(&run.result),
        None => Ok(ParsedActions::default()),
    }
}

/// Format a run's history as report text and parse it back.
pub fn replay_actions(result: &RunResult) -> Result<ParsedActions> {
    let text = format_actions(result.history(), result.tick_duration);
    Ok(ParsedActions::parse(&text)?)
}
