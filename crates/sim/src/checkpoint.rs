//! Saving and resuming a run.
//!
//! A checkpoint named `<name>` in `<dir>` consists of
//!
//! ```text
//! <dir>/<name>.png                   snapshot of the current image
//! <dir>/<name>.restore/<name>.idx    index field, raw i32
//! <dir>/<name>.restore/<name>.len    length field, raw f64
//! <dir>/<name>.restore/<name>.pos    per-line state, raw i32
//! ```
//!
//! The raw files use native byte order and carry no header.

use crate::engine::{Fields, SimulationEngine};
use log::{debug, info, warn};
use pendulum_core::SimError;
use pendulum_render::snapshot;
use std::path::{Path, PathBuf};

/// File locations of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    pub snapshot: PathBuf,
    pub dir: PathBuf,
    pub index: PathBuf,
    pub length: PathBuf,
    pub lines: PathBuf,
}

impl CheckpointPaths {
    pub fn new(dir: &Path, name: &str) -> Self {
        let restore = dir.join(format!("{name}.restore"));
        Self {
            snapshot: dir.join(format!("{name}.png")),
            index: restore.join(format!("{name}.idx")),
            length: restore.join(format!("{name}.len")),
            lines: restore.join(format!("{name}.pos")),
            dir: restore,
        }
    }

    /// Checkpoint next to a config file, named after its stem.
    pub fn for_config(config: &Path) -> Result<Self, SimError> {
        let name = config
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                SimError::Config(format!(
                    "cannot derive a checkpoint name from {}",
                    config.display()
                ))
            })?;
        let dir = match config.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        Ok(Self::new(dir, name))
    }
}

/// What [`SimulationEngine::restore`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// State reloaded; `lines_done` lines need no recomputation.
    Resumed { lines_done: usize },
    /// No usable checkpoint; the run starts from scratch.
    Fresh { reason: String },
}

impl SimulationEngine {
    /// Writes the three raw state files, then the snapshot image.
    ///
    /// The fields stay read-locked throughout, so the saved line states
    /// never claim a line whose cells are missing from the saved fields.
    /// Only the raw files are needed to resume: a failed snapshot is logged
    /// and does not fail the dump.
    pub fn dump(&self, paths: &CheckpointPaths) -> Result<(), SimError> {
        let fields = self.fields();
        std::fs::create_dir_all(&paths.dir)
            .map_err(|e| SimError::checkpoint_write(&paths.dir, e))?;
        fields.index.write(&paths.index)?;
        fields.length.write(&paths.length)?;
        self.scheduler().save_checkpoint(&paths.lines)?;
        info!(
            "checkpoint written to {} ({}/{} lines done)",
            paths.dir.display(),
            self.scheduler().lines_done(),
            self.scheduler().len()
        );
        if let Err(e) = self.write_snapshot(&fields, &paths.snapshot) {
            warn!("snapshot {} not written: {e}", paths.snapshot.display());
        }
        Ok(())
    }

    /// Writes the current image as a PNG; unprocessed cells are black.
    pub fn render_snapshot(&self, path: &Path) -> Result<(), SimError> {
        self.write_snapshot(&self.fields(), path)
    }

    fn write_snapshot(&self, fields: &Fields, path: &Path) -> Result<(), SimError> {
        snapshot::write_png(
            &fields.index,
            &fields.length,
            self.max_length(),
            self.sources(),
            self.color_scheme(),
            path,
        )
    }

    /// Reloads a checkpoint, or resets to a fresh run if none is usable.
    ///
    /// Unreadable or inconsistent files are not an error: they are logged
    /// and the engine is reset. Only a checkpoint whose indices name
    /// sources this configuration does not have fails, with
    /// `SimError::IndexMismatch`.
    pub fn restore(&self, paths: &CheckpointPaths) -> Result<RestoreOutcome, SimError> {
        self.reset();
        match self.load(paths) {
            Ok(lines_done) => {
                info!(
                    "resumed from {} ({lines_done}/{} lines done)",
                    paths.dir.display(),
                    self.scheduler().len()
                );
                Ok(RestoreOutcome::Resumed { lines_done })
            }
            Err(err @ SimError::CheckpointRead { .. }) => {
                self.reset();
                warn!("no usable checkpoint, starting fresh: {err}");
                Ok(RestoreOutcome::Fresh {
                    reason: err.to_string(),
                })
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    fn load(&self, paths: &CheckpointPaths) -> Result<usize, SimError> {
        let max_len = {
            let mut fields = self.fields_mut();
            fields.index.read(&paths.index)?;
            fields.length.read(&paths.length)?;

            let count = self.sources().len();
            for &v in fields.index.data() {
                if v < -1 {
                    return Err(SimError::checkpoint_read(
                        &paths.index,
                        format!("invalid source index {v}"),
                    ));
                }
                if v >= 0 && v as usize >= count {
                    return Err(SimError::IndexMismatch { index: v, count });
                }
            }
            if let Some(v) = fields.length.data().iter().find(|v| !v.is_finite()) {
                return Err(SimError::checkpoint_read(
                    &paths.length,
                    format!("non-finite length {v}"),
                ));
            }
            fields.length.max()
        };
        self.scheduler().restore_checkpoint(&paths.lines)?;
        debug!("restored fields from {}, max length {max_len}", paths.dir.display());
        self.set_max_length(max_len.max(0.0));
        self.request_renormalize();
        Ok(self.scheduler().lines_done())
    }
}
