//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: simulation error (index mismatch, worker failure or panic)
//! - 11: I/O error (config read, snapshot, checkpoint write)
//! - 12: input error (bad configuration, bad color scheme)

use pendulum_core::SimError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    /// A failure while running the simulation.
    Simulation(SimError),
    /// Worker threads that panicked.
    Panicked(usize),
    /// A file could not be read or written.
    Io(String),
    /// The configuration was rejected.
    Input(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Simulation(_) | CliError::Panicked(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Simulation(e) => write!(f, "{e}"),
            CliError::Panicked(n) => write!(f, "{n} worker thread(s) panicked"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<SimError> for CliError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::Io(msg) => CliError::Io(msg),
            e @ SimError::CheckpointWrite { .. } => CliError::Io(e.to_string()),
            e @ (SimError::Config(_)
            | SimError::UnknownForceLaw(_)
            | SimError::Evaluator { .. }
            | SimError::InvalidDimensions) => CliError::Input(e.to_string()),
            other => CliError::Simulation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_error_exit_code_is_10() {
        let err = CliError::Simulation(SimError::IndexMismatch { index: 4, count: 2 });
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn panicked_workers_exit_code_is_10() {
        let err = CliError::Panicked(2);
        assert_eq!(err.exit_code(), 10);
        assert!(err.to_string().contains("2 worker"));
    }

    #[test]
    fn io_error_exit_code_is_11() {
        let err = CliError::Io("write failed".into());
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn input_error_exit_code_is_12() {
        let err = CliError::Input("bad friction".into());
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn from_sim_error_io_routes_to_cli_io() {
        let cli_err = CliError::from(SimError::Io("disk full".into()));
        assert_eq!(cli_err.exit_code(), 11);
        assert!(cli_err.to_string().contains("disk full"));
    }

    #[test]
    fn from_checkpoint_write_routes_to_cli_io() {
        let cli_err = CliError::from(SimError::checkpoint_write("/tmp/run.idx", "denied"));
        assert_eq!(cli_err.exit_code(), 11);
        assert!(cli_err.to_string().contains("run.idx"));
    }

    #[test]
    fn from_config_errors_route_to_cli_input() {
        for e in [
            SimError::Config("friction".into()),
            SimError::UnknownForceLaw("CUBIC".into()),
            SimError::InvalidDimensions,
        ] {
            assert_eq!(CliError::from(e).exit_code(), 12);
        }
    }

    #[test]
    fn from_index_mismatch_routes_to_cli_simulation() {
        let cli_err = CliError::from(SimError::IndexMismatch { index: 3, count: 1 });
        assert_eq!(cli_err.exit_code(), 10);
        assert!(cli_err.to_string().contains('3'));
    }
}
