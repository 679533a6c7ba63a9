//! Error types for the pendulum engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, simulating, drawing, or checkpointing.
#[derive(Debug, Error)]
pub enum SimError {
    /// Grid columns or rows were zero, or their product overflowed.
    #[error("invalid dimensions: columns and rows must be non-zero")]
    InvalidDimensions,

    /// A configuration key was missing, malformed, or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A source declared a force law that is not in the registry.
    #[error("invalid source type identifier: \"{0}\" (valid values are LINEAR, INV, INV_SQR, INV_QRT)")]
    UnknownForceLaw(String),

    /// The color scheme expression failed to parse or evaluate.
    #[error("color scheme expression \"{expression}\" failed: {message}")]
    Evaluator { expression: String, message: String },

    /// A stored source index does not fit the configured source list.
    #[error("source index {index} out of bounds for {count} sources (configuration does not match)")]
    IndexMismatch { index: i32, count: usize },

    /// A checkpoint file was missing, short, or corrupt.
    #[error("cannot read checkpoint {}: {message}", path.display())]
    CheckpointRead { path: PathBuf, message: String },

    /// A checkpoint file could not be written.
    #[error("cannot write checkpoint {}: {message}", path.display())]
    CheckpointWrite { path: PathBuf, message: String },

    /// Any other I/O failure (config file, snapshot image).
    #[error("i/o error: {0}")]
    Io(String),
}

impl SimError {
    /// Builds a [`SimError::CheckpointRead`] from an I/O error.
    pub fn checkpoint_read(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        SimError::CheckpointRead {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Builds a [`SimError::CheckpointWrite`] from an I/O error.
    pub fn checkpoint_write(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        SimError::CheckpointWrite {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
