use anyhow::{Context, Result};
use clap::Parser;
use meadow_core::{init_logging, SimulationParams};
use meadow_io::{load_snapshot, save_snapshot, write_json_file, EventLog};
use meadow_lib::app::{RunnerUpdate, SimulationRunner};
use meadow_lib::model::Engine;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless meadow ecosystem simulation", long_about = None)]
struct Args {
    /// Parameter file (TOML). Defaults are used when it does not exist.
    #[arg(short, long, default_value = "meadow.toml")]
    config: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 500)]
    ticks: u64,

    /// Overrides `world.seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long, default_value_t = 1)]
    interval_ms: u64,

    /// Resume from a snapshot instead of seeding a fresh meadow
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a snapshot here when finished
    #[arg(long)]
    save: Option<PathBuf>,

    /// Append events as JSON lines to this file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the final tick summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut params = SimulationParams::load(&args.config)?;
    if let Some(seed) = args.seed {
        params.world.seed = Some(seed);
    }
    let snapshot = match &args.load {
        Some(path) => {
            let saved = load_snapshot(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            params.world.width = saved.width;
            params.world.height = saved.height;
            Some(saved)
        }
        None => None,
    };

    let engine = Engine::with_procedural_genetics(params)?;
    let (runner, handle, mut updates) =
        SimulationRunner::new(engine, Duration::from_millis(args.interval_ms));
    let task = tokio::spawn(runner.run());

    match snapshot {
        Some(saved) => handle.load(saved).await?,
        None => handle.initialize().await?,
    }
    let start_tick = handle.summary().await?.tick;
    let target = start_tick + args.ticks;

    let mut log = match &args.events {
        Some(path) => Some(EventLog::open(path)?),
        None => None,
    };

    handle.start()?;
    while args.ticks > 0 {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else { break };
                let (events, done) = match update {
                    RunnerUpdate::Tick(out) => (out.events, out.tick >= target),
                    RunnerUpdate::Flush { events, .. } => (events, false),
                };
                if let Some(log) = log.as_mut() {
                    log.append_all(&events)?;
                }
                if done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    handle.pause()?;

    let summary = handle.summary().await?;
    tracing::info!(
        tick = summary.tick,
        population = summary.population(),
        flowers_created = summary.totals.flowers_created,
        "Run finished"
    );
    if let Some(path) = &args.summary {
        write_json_file(&summary, path)?;
    }
    if let Some(path) = &args.save {
        let saved = handle.save().await?;
        save_snapshot(&saved, path)
            .with_context(|| format!("Failed to save snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "Snapshot written");
    }
    if let Some(log) = log.as_mut() {
        log.flush()?;
    }

    handle.shutdown();
    task.await.context("Runner task panicked")?;
    Ok(())
}
