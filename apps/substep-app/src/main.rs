//! Substep solver CLI.
//!
//! Provides three modes of operation:
//! - `simulate`: Run a single-body rapier scenario and print the outcome
//! - `check`: Load and validate a scenario file without running it
//! - `info`: Print crate versions and solver limits

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use substep_core::prelude::*;
use substep_rapier::{Scenario, ScenarioConfig, ScenarioSummary};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Fixed-rate force accumulation and prediction on top of rapier.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print the final body state.
    Simulate {
        /// Scenario TOML file. Built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the simulated duration in seconds.
        #[arg(short, long)]
        duration: Option<f32>,

        /// Override the sub-step rate (clamped to the valid range).
        #[arg(short, long)]
        operations: Option<u32>,
    },

    /// Validate a scenario file without running it. Out-of-range values are
    /// reported, not clamped.
    Check {
        /// Scenario TOML file.
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load(path: Option<&Path>) -> anyhow::Result<ScenarioConfig> {
    match path {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display())),
        None => Ok(ScenarioConfig::default()),
    }
}

fn print_summary(summary: &ScenarioSummary) {
    let s = &summary.final_state;
    println!(
        "time={} host_steps={} substeps={} idle={}",
        summary.time, summary.host_steps, summary.substeps, summary.idle_steps
    );
    println!(
        "position=({:.4}, {:.4}, {:.4})",
        s.position.x, s.position.y, s.position.z
    );
    println!(
        "velocity=({:.4}, {:.4}, {:.4}) predicted=({:.4}, {:.4}, {:.4})",
        s.linear_velocity.x,
        s.linear_velocity.y,
        s.linear_velocity.z,
        summary.predicted_velocity.x,
        summary.predicted_velocity.y,
        summary.predicted_velocity.z
    );
    println!(
        "angular_velocity=({:.4}, {:.4}, {:.4})",
        s.angular_velocity.x, s.angular_velocity.y, s.angular_velocity.z
    );
}

fn run_simulate(
    path: Option<&Path>,
    duration: Option<f32>,
    operations: Option<u32>,
) -> anyhow::Result<()> {
    let mut config = load(path)?;
    if let Some(duration) = duration {
        config.duration = duration;
    }
    if let Some(operations) = operations {
        config.solver = SolverConfig::new(operations);
    }
    info!(
        host_dt = config.host_dt,
        duration = config.duration,
        operations = config.solver.operations,
        "starting scenario"
    );

    let mut scenario = Scenario::new(config).context("failed to build scenario")?;
    let summary = scenario.run().context("scenario failed")?;
    print_summary(&summary);
    Ok(())
}

fn run_check(path: &Path) -> anyhow::Result<()> {
    let config = ScenarioConfig::from_file_strict(path)
        .with_context(|| format!("invalid scenario {}", path.display()))?;
    println!(
        "ok: host_dt={} duration={} operations={} host_steps={}",
        config.host_dt,
        config.duration,
        config.solver.operations,
        config.host_steps()
    );
    Ok(())
}

fn run_info() {
    println!("substep v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  substep-core   {}", env!("CARGO_PKG_VERSION"));
    println!("  substep-solver {}", env!("CARGO_PKG_VERSION"));
    println!("  substep-rapier {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("operations: [{MIN_OPERATIONS}, {MAX_OPERATIONS}]");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Simulate {
            config,
            duration,
            operations,
        }) => run_simulate(config.as_deref(), duration, operations),
        Some(Commands::Check { config }) => run_check(&config),
        Some(Commands::Info) => {
            run_info();
            Ok(())
        }
        None => run_simulate(None, None, None),
    }
}
