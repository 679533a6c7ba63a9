#![deny(unsafe_code)]
//! Parallel computation of a magnetic-pendulum basin image.
//!
//! [`SimulationEngine`] integrates pendulums and stores their outcome,
//! [`LineScheduler`] hands grid lines to workers, [`WorkerPool`] runs them,
//! and [`Simulation`] ties an engine to a drawing surface. Runs can be
//! saved and resumed through [`CheckpointPaths`].

pub mod checkpoint;
pub mod engine;
pub mod pool;
pub mod scheduler;
pub mod view;

pub use checkpoint::{CheckpointPaths, RestoreOutcome};
pub use engine::{Fields, SimulationEngine, Trajectory, TRACE_STRIDE};
pub use pool::{PoolOptions, PoolReport, WorkerPool, TRACE_COLUMN_STRIDE};
pub use scheduler::LineScheduler;
pub use view::Simulation;
