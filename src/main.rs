//! Boostline command line.
//!
//! Usage:
//!   boostline run --platform pc --galaxies 0 --boosts 3 --policy heuristic
//!   boostline run --boosts 6 --purchases-from saved.txt --sacrifices-from saved.txt
//!   boostline optimize --platform mobile --galaxies 1 --boosts 7
//!   boostline sweep --policy T12345678
//!   boostline summary --policy heuristic

use anyhow::{Context, Result};
use boostline::build_info;
use boostline::core::balance::{DEFAULT_MAX_ITERATIONS, DEFAULT_SACRIFICE_STEP};
use boostline::core::scenario::{Platform, Scenario, GALAXY_RANGE};
use boostline::core::Ruleset;
use boostline::engine::SimulationEngine;
use boostline::optimizer::{sweep, ConvergenceController, OptimizerConfig, SweepPlan};
use boostline::policy::{
    IncrementalSacrifice, NeverSacrifice, PolicyKind, PurchasePolicy, ReplayPurchases,
    ReplaySacrifices, SacrificePolicy,
};
use boostline::report::{format_time, load_report, Report, ReportStore};
use boostline::telemetry::{ProcHostProbe, TracingSink};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "boostline")]
#[command(about = "Search the fastest purchase and sacrifice sequence for each progression stage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate one scenario once and print or save its report
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
        policy: PolicyKind,
        #[arg(long, value_enum, default_value_t = SacrificeKind::Never)]
        sacrifice: SacrificeKind,
        #[arg(long, default_value_t = DEFAULT_SACRIFICE_STEP)]
        step: f64,
        /// Replay the purchases of a saved report instead of --policy
        #[arg(long, value_name = "REPORT")]
        purchases_from: Option<PathBuf>,
        /// Replay the sacrifices of a saved report instead of --sacrifice
        #[arg(long, value_name = "REPORT")]
        sacrifices_from: Option<PathBuf>,
        /// Save under this directory instead of printing
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Alternate purchase and sacrifice refinement until it stops improving
    Optimize {
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
        policy: PolicyKind,
        #[arg(long, default_value_t = DEFAULT_SACRIFICE_STEP)]
        step: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        #[arg(long, default_value = "saved_runs")]
        output: PathBuf,
    },
    /// Optimize every scenario in range and write the policy summary
    Sweep {
        #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
        policy: PolicyKind,
        #[arg(long = "platform", value_enum, default_values_t = Platform::all())]
        platforms: Vec<Platform>,
        #[arg(long = "galaxy", default_values_t = GALAXY_RANGE)]
        galaxies: Vec<u8>,
        #[arg(long, default_value_t = DEFAULT_SACRIFICE_STEP)]
        step: f64,
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        #[arg(long, default_value = "saved_runs")]
        output: PathBuf,
    },
    /// Rebuild the policy summary from saved reports
    Summary {
        #[arg(long, value_enum, default_value_t = PolicyKind::Heuristic)]
        policy: PolicyKind,
        #[arg(long = "platform", value_enum, default_values_t = Platform::all())]
        platforms: Vec<Platform>,
        #[arg(long = "galaxy", default_values_t = GALAXY_RANGE)]
        galaxies: Vec<u8>,
        #[arg(long, default_value = "saved_runs")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ScenarioArgs {
    #[arg(long, value_enum, default_value_t = Platform::Pc)]
    platform: Platform,
    #[arg(long, default_value_t = 0)]
    galaxies: u8,
    #[arg(long, default_value_t = 0)]
    boosts: u8,
}

impl ScenarioArgs {
    fn scenario(self) -> Scenario {
        Scenario::new(self.platform, self.galaxies, self.boosts)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SacrificeKind {
    Never,
    Incremental,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!(build = %build_info::describe(), "boostline");

    match cli.command {
        Commands::Run {
            scenario,
            policy,
            sacrifice,
            step,
            purchases_from,
            sacrifices_from,
            output,
        } => {
            let scenario = scenario.scenario();
            let rules = Ruleset::for_scenario(&scenario)
                .with_context(|| format!("no ruleset for {scenario}"))?;
            let purchase: Box<dyn PurchasePolicy> = match purchases_from {
                Some(path) => Box::new(
                    ReplayPurchases::from_report(&read_report(&path)?)
                        .with_context(|| format!("no purchases in {}", path.display()))?,
                ),
                None => policy.build(),
            };
            let sacrifice: Box<dyn SacrificePolicy> = match (sacrifices_from, sacrifice) {
                (Some(path), _) => Box::new(
                    ReplaySacrifices::from_report(&read_report(&path)?)
                        .with_context(|| format!("no sacrifices in {}", path.display()))?,
                ),
                (None, SacrificeKind::Never) => Box::new(NeverSacrifice),
                (None, SacrificeKind::Incremental) => Box::new(
                    IncrementalSacrifice::new(step).context("invalid sacrifice step")?,
                ),
            };
            let engine = SimulationEngine::new(rules, purchase.as_ref(), sacrifice.as_ref())
                .context("failed to start the engine")?;
            let result = engine
                .run(&mut TracingSink, &ProcHostProbe)
                .with_context(|| format!("simulation of {scenario} failed"))?;

            let report = Report::single(&result);
            match output {
                Some(root) => {
                    let path = ReportStore::new(root)
                        .save(purchase.short_name(), &report)
                        .context("failed to save report")?;
                    info!(path = %path.display(), "Report written");
                }
                None => print!("{}", report.to_text().context("failed to format report")?),
            }
        }
        Commands::Optimize {
            scenario,
            policy,
            step,
            max_iterations,
            output,
        } => {
            let scenario = scenario.scenario();
            let mut config = OptimizerConfig::for_scenario(&scenario)
                .with_context(|| format!("no ruleset for {scenario}"))?;
            config.sacrifice_step = step;
            config.max_iterations = max_iterations;
            let purchase = policy.build();
            let host = ProcHostProbe;
            let session = ConvergenceController::new(config, purchase.as_ref(), &host)
                .with_store(ReportStore::new(output))
                .run(&mut TracingSink)
                .with_context(|| format!("optimization of {scenario} failed"))?;
            if let Some(winner) = session.winner() {
                println!(
                    "{scenario}: {} ticks ({}) after {} runs",
                    winner.result.ticks,
                    format_time(winner.result.game_time()),
                    session.len()
                );
            }
        }
        Commands::Sweep {
            policy,
            platforms,
            galaxies,
            step,
            max_iterations,
            output,
        } => {
            let plan = SweepPlan {
                platforms,
                galaxies,
                sacrifice_step: step,
                max_iterations,
                ..SweepPlan::default()
            };
            let purchase = policy.build();
            let summary = sweep(
                &plan,
                purchase.as_ref(),
                &ReportStore::new(output),
                &ProcHostProbe,
                &mut TracingSink,
            )
            .context("sweep failed")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Summary {
            policy,
            platforms,
            galaxies,
            output,
        } => {
            let purchase = policy.build();
            let summary = ReportStore::new(output)
                .write_summary(
                    purchase.short_name(),
                    purchase.description(),
                    &platforms,
                    &galaxies,
                )
                .context("failed to summarize saved reports")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

fn read_report(path: &Path) -> Result<Report> {
    load_report(path).with_context(|| format!("failed to read report {}", path.display()))
}
