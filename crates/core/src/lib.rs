#![deny(unsafe_code)]
//! Core types for the magnetic pendulum basin engine.
//!
//! Provides the `FieldMatrix` result buffers, `ForceSource` with its closed
//! set of `ForceLaw`s, the `Grid` coordinate mapping, the validated
//! `SimConfig`, the `ColorScheme` expression and the `SimError` type.

pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod source;

pub use color::{ColorScheme, Rgb};
pub use config::{IntegrationParams, SimConfig, ThreadCount};
pub use error::SimError;
pub use field::FieldMatrix;
pub use glam::DVec2;
pub use grid::Grid;
pub use source::{ForceLaw, ForceSource};

/// Index field value of a cell that has not been computed.
pub const UNPROCESSED: i32 = -1;
