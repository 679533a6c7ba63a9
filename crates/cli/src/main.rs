#![deny(unsafe_code)]
//! CLI binary for the pendulum engine.
//!
//! `pendulum <config.json>` loads a run configuration, resumes from the
//! checkpoint next to it if one exists, computes the remaining lines on a
//! worker pool and writes the image and checkpoint on exit. Ctrl-C stops
//! the workers early; unfinished lines are saved as Pending.

mod error;

use clap::Parser;
use error::CliError;
use log::{info, warn};
use pendulum_core::SimConfig;
use pendulum_render::FrameBuffer;
use pendulum_sim::{CheckpointPaths, PoolOptions, RestoreOutcome, Simulation, WorkerPool};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the main thread checks for finished workers or an interrupt.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "pendulum", about = "Magnetic pendulum basin renderer")]
struct Cli {
    /// Path to the JSON run configuration.
    config: PathBuf,
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = SimConfig::load(&cli.config)?;
    let paths = CheckpointPaths::for_config(&cli.config)?;
    let (cols, rows) = (config.grid.cols(), config.grid.rows());
    let threads = config.thread_count();

    let sim = Arc::new(Simulation::new(&config, FrameBuffer::new(cols, rows)?)?);
    match sim.restore(&paths)? {
        RestoreOutcome::Resumed { lines_done } => {
            info!("{lines_done} of {rows} lines restored")
        }
        RestoreOutcome::Fresh { .. } => info!("starting a new {cols}x{rows} run"),
    }

    let options = PoolOptions {
        threads,
        batch_mode: config.batch_mode,
        show_traces: config.show_traces,
        checkpoint_every: config.checkpoint_every,
        checkpoint: Some(paths.clone()),
    };
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::Release))
            .map_err(|e| CliError::Io(format!("cannot install interrupt handler: {e}")))?;
    }

    let pool = WorkerPool::start(Arc::clone(&sim), options)?;
    while !pool.is_finished() {
        if interrupted.load(Ordering::Acquire) {
            info!("interrupted, saving progress");
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    // Progress is saved even when a worker failed; its line stays Pending.
    let (report, dumped) = pool.finalize(&sim, &paths);
    info!("{} worker(s) joined", report.workers_joined);
    dumped?;

    if report.panicked > 0 {
        return Err(CliError::Panicked(report.panicked));
    }
    if let Some(first) = report.failures.into_iter().next() {
        return Err(first.into());
    }

    let done = sim.engine().scheduler().lines_done();
    if done < rows {
        warn!("{} line(s) left unfinished", rows - done);
    }
    eprintln!(
        "rendered {cols}x{rows} ({} sources, {threads} threads, {done}/{rows} lines) -> {}",
        sim.engine().sources().len(),
        paths.snapshot.display()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}
