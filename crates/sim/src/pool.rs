//! Worker threads computing lines in parallel.
//!
//! Each worker repeatedly claims a line, computes every cell of it, pushes
//! it to the surface and marks it Done. Clearing the shared running flag
//! makes workers leave after their current cell; a line interrupted that
//! way stays Pending and is recomputed on resume.

use crate::checkpoint::CheckpointPaths;
use crate::view::Simulation;
use log::{debug, error, info};
use pendulum_core::{DVec2, SimError};
use pendulum_render::Surface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// With traces on, every this many columns a trajectory is drawn.
pub const TRACE_COLUMN_STRIDE: usize = 5;

/// How a pool runs.
#[derive(Debug, Clone, Default)]
pub struct PoolOptions {
    /// Worker count; clamped to at least one.
    pub threads: usize,
    /// Stop the pool once every line is Done.
    pub batch_mode: bool,
    /// Draw trajectories while computing.
    pub show_traces: bool,
    /// Dump a checkpoint after every this many finished lines (0 = never).
    pub checkpoint_every: usize,
    /// Where periodic checkpoints go; required for `checkpoint_every > 0`.
    pub checkpoint: Option<CheckpointPaths>,
}

/// Outcome of [`WorkerPool::join`].
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Workers that returned normally, with or without an error.
    pub workers_joined: usize,
    /// Errors that stopped a worker.
    pub failures: Vec<SimError>,
    /// Workers that panicked.
    pub panicked: usize,
}

impl PoolReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.panicked == 0
    }
}

struct Shared<S> {
    sim: Arc<Simulation<S>>,
    running: Arc<AtomicBool>,
    show_traces: Arc<AtomicBool>,
    options: PoolOptions,
    dump_lock: Mutex<()>,
}

/// A running set of line workers.
pub struct WorkerPool {
    running: Arc<AtomicBool>,
    show_traces: Arc<AtomicBool>,
    workers: Vec<JoinHandle<Result<(), SimError>>>,
}

impl WorkerPool {
    /// Spawns the workers.
    ///
    /// Returns `SimError::Config` for periodic checkpoints without a
    /// location and `SimError::Io` if a thread cannot be spawned (any
    /// workers already started are stopped and joined).
    pub fn start<S>(sim: Arc<Simulation<S>>, options: PoolOptions) -> Result<Self, SimError>
    where
        S: Surface + 'static,
    {
        if options.checkpoint_every > 0 && options.checkpoint.is_none() {
            return Err(SimError::Config(
                "periodic checkpoints need a checkpoint location".into(),
            ));
        }
        let threads = options.threads.max(1);
        let running = Arc::new(AtomicBool::new(true));
        let show_traces = Arc::new(AtomicBool::new(options.show_traces));
        let shared = Arc::new(Shared {
            sim,
            running: Arc::clone(&running),
            show_traces: Arc::clone(&show_traces),
            options,
            dump_lock: Mutex::new(()),
        });

        let mut pool = Self {
            running,
            show_traces,
            workers: Vec::with_capacity(threads),
        };
        for i in 0..threads {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("pendulum-worker-{i}"))
                .spawn(move || {
                    let result = worker_loop(i, &shared);
                    if let Err(e) = &result {
                        error!("worker {i} stopped: {e}");
                    }
                    result
                });
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    pool.stop();
                    pool.join_all();
                    return Err(SimError::Io(format!("cannot spawn worker thread: {e}")));
                }
            }
        }
        info!("started {threads} worker thread(s)");
        Ok(pool)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Asks every worker to leave after its current cell.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// True once every worker has returned, normally or not.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(JoinHandle::is_finished)
    }

    /// Flips trajectory drawing; returns the new setting.
    pub fn toggle_traces(&self) -> bool {
        !self.show_traces.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn traces_enabled(&self) -> bool {
        self.show_traces.load(Ordering::Acquire)
    }

    /// Waits for every worker to finish.
    pub fn join(mut self) -> PoolReport {
        self.join_all()
    }

    /// Stops the workers, then writes a checkpoint, then joins.
    ///
    /// Writing before the join keeps shutdown latency at one cell; lines
    /// still in flight are saved as Pending.
    pub fn finalize<S: Surface>(
        self,
        sim: &Simulation<S>,
        paths: &CheckpointPaths,
    ) -> (PoolReport, Result<(), SimError>) {
        info!("stopping workers");
        self.stop();
        let dumped = sim.dump(paths);
        (self.join(), dumped)
    }

    fn join_all(&mut self) -> PoolReport {
        let mut report = PoolReport::default();
        for handle in self.workers.drain(..) {
            match handle.join() {
                Ok(Ok(())) => report.workers_joined += 1,
                Ok(Err(e)) => {
                    report.workers_joined += 1;
                    report.failures.push(e);
                }
                Err(_) => report.panicked += 1,
            }
        }
        report
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop();
            self.join_all();
        }
    }
}

fn worker_loop<S: Surface>(id: usize, shared: &Shared<S>) -> Result<(), SimError> {
    let sim = &*shared.sim;
    let engine = sim.engine();
    let cols = engine.grid().cols();
    let mut trace: Vec<DVec2> = Vec::new();

    while shared.running.load(Ordering::Acquire) {
        let Some(row) = engine.scheduler().claim_next() else {
            break;
        };
        debug!("worker {id} computing line {row}");

        let mut interrupted = false;
        for col in 0..cols {
            if !shared.running.load(Ordering::Acquire) {
                interrupted = true;
                break;
            }
            if col % TRACE_COLUMN_STRIDE == 0 && shared.show_traces.load(Ordering::Relaxed) {
                let source = engine.compute_cell(col, row, Some(&mut trace));
                sim.draw_trace(&trace, source);
            } else {
                engine.compute_cell(col, row, None);
            }
        }
        if interrupted {
            debug!("worker {id} left line {row} unfinished");
            break;
        }

        sim.refresh_line(row)?;
        sim.draw_model();
        let done = engine.scheduler().mark_done(row);

        let every = shared.options.checkpoint_every;
        if every > 0 && done % every == 0 {
            if let Some(paths) = &shared.options.checkpoint {
                let _guard = shared
                    .dump_lock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = sim.dump(paths) {
                    shared.running.store(false, Ordering::Release);
                    return Err(e);
                }
            }
        }

        if shared.options.batch_mode && engine.scheduler().is_complete() {
            info!("all {} lines done", engine.scheduler().len());
            shared.running.store(false, Ordering::Release);
        }
    }
    Ok(())
}
