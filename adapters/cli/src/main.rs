#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs an action stage headlessly.

mod placement;

use std::{path::PathBuf, time::Duration};

use action_stage_core::{Command, Event, StageResult, StageState};
use action_stage_manager::{ActionManager, StageDefinition};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::placement::PlacementArg;

/// Highest accepted `--fps`; keeps the fixed step well above zero.
const MAX_FPS: i64 = 10_000;

/// Runs a stage file at a fixed frame rate and prints the result as JSON.
#[derive(Debug, Parser)]
#[command(name = "action-stage", version, about)]
struct Args {
    /// Stage file to run.
    stage: PathBuf,
    /// Simulation steps per simulated second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=MAX_FPS))]
    fps: u32,
    /// Simulated seconds after which an unfinished run is abandoned.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,
    /// Unit placed right after the stage starts. May be repeated.
    #[arg(long = "place", value_name = "NAME@ROW,COL")]
    placements: Vec<PlacementArg>,
    /// Replaces the stage file's spawn seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Pretty-prints the JSON report.
    #[arg(long)]
    pretty: bool,
}

/// Summary printed once the run ends.
#[derive(Debug, Serialize)]
struct RunReport {
    state: StageState,
    steps: u64,
    result: StageResult,
}

/// Entry point for the action stage command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let report = run(&args)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to encode the run report")?;
    println!("{json}");
    Ok(())
}

fn run(args: &Args) -> Result<RunReport> {
    let limit = Duration::try_from_secs_f32(args.max_seconds)
        .context("--max-seconds must be a non-negative number of seconds")?;

    let mut definition = StageDefinition::load(&args.stage)
        .with_context(|| format!("failed to load stage {}", args.stage.display()))?;
    if let Some(seed) = args.seed {
        definition.seed = seed;
    }

    let mut placements = Vec::with_capacity(args.placements.len());
    for placement in &args.placements {
        let profile = definition
            .config
            .profile_id(&placement.unit)
            .with_context(|| format!("stage has no unit named '{}'", placement.unit))?;
        placements.push((placement, profile));
    }

    let mut manager = ActionManager::new(definition);
    manager.start();
    for (placement, profile) in placements {
        manager.submit(Command::PlaceUnit {
            profile,
            tile: placement.tile,
        });
        let rejection = manager.drain_events().into_iter().find_map(|event| match event {
            Event::PlacementRejected { reason, .. } => Some(reason),
            _ => None,
        });
        if let Some(reason) = rejection {
            bail!("cannot place {placement}: {reason:?}");
        }
        info!(%placement, "unit placed");
    }

    let dt = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let steps = manager.run_until_concluded(dt, limit);
    let state = manager.state();
    if !state.is_terminal() {
        warn!(?state, "stage did not conclude before the time limit");
    }

    Ok(RunReport {
        state,
        steps,
        result: manager.result(),
    })
}
