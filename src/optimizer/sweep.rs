//! Optimize every scenario of a range and summarize the policy.

use super::{ConvergenceController, OptimizerConfig};
use crate::core::balance::{DEFAULT_MAX_ITERATIONS, DEFAULT_SACRIFICE_STEP};
use crate::core::scenario::{Platform, Scenario, GALAXY_RANGE};
use crate::engine::EngineLimits;
use crate::error::Result;
use crate::policy::PurchasePolicy;
use crate::report::{ReportStore, StrategySummary};
use crate::telemetry::{HostProbe, TelemetrySink};
use tracing::info;

/// Which scenarios a sweep covers and how each is optimized.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub platforms: Vec<Platform>,
    pub galaxies: Vec<u8>,
    pub sacrifice_step: f64,
    pub max_iterations: usize,
    pub limits: EngineLimits,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            platforms: Platform::all().to_vec(),
            galaxies: GALAXY_RANGE.to_vec(),
            sacrifice_step: DEFAULT_SACRIFICE_STEP,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            limits: EngineLimits::default(),
        }
    }
}

impl SweepPlan {
    /// Every boost of every galaxy on every platform, in sweep order.
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.platforms
            .iter()
            .flat_map(|&platform| {
                self.galaxies
                    .iter()
                    .flat_map(move |&galaxies| Scenario::all_for(platform, galaxies))
            })
            .collect()
    }
}

/// Run the controller for every scenario of the plan, saving each session,
/// then write the policy summary.
pub fn sweep(
    plan: &SweepPlan,
    policy: &dyn PurchasePolicy,
    store: &ReportStore,
    host: &dyn HostProbe,
    telemetry: &mut dyn TelemetrySink,
) -> Result<StrategySummary> {
    let scenarios = plan.scenarios();
    info!(policy = policy.name(), scenarios = scenarios.len(), "Sweep started");
    for scenario in &scenarios {
        let mut config = OptimizerConfig::for_scenario(scenario)?;
        config.sacrifice_step = plan.sacrifice_step;
        config.max_iterations = plan.max_iterations;
        config.limits = plan.limits;
        ConvergenceController::new(config, policy, host)
            .with_store(store.clone())
            .run(telemetry)?;
    }
    store.write_summary(
        policy.short_name(),
        policy.description(),
        &plan.platforms,
        &plan.galaxies,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_covers_reference_range() {
        let scenarios = SweepPlan::default().scenarios();
        // galaxies 0, 1 and 2 have 9, 13 and 17 boosts on each platform
        assert_eq!(scenarios.len(), 2 * (9 + 13 + 17));
        assert_eq!(scenarios[0], Scenario::new(Platform::Pc, 0, 0));
        assert_eq!(
            scenarios.last().copied(),
            Some(Scenario::new(Platform::Mobile, 2, 16))
        );
    }

    #[test]
    fn test_plan_subset() {
        let plan = SweepPlan {
            platforms: vec![Platform::Mobile],
            galaxies: vec![1],
            ..SweepPlan::default()
        };
        let scenarios = plan.scenarios();
        assert_eq!(scenarios.len(), 13);
        assert!(scenarios.iter().all(|s| s.platform == Platform::Mobile && s.galaxies == 1));
    }
}
