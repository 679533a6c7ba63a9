//! Distribution of grid lines to worker threads.
//!
//! Every line is either Pending or Done. Workers claim lines in ascending row
//! order through a short critical section; a claimed line is handed to
//! exactly one worker per pass. Progress is persisted as a raw `i32` array
//! holding the line id while Pending and `-1` once Done.

use pendulum_core::{FieldMatrix, SimError};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Persisted marker of a Done line.
const DONE: i32 = -1;

#[derive(Debug)]
struct SchedulerState {
    /// One row, one column per line.
    lines: FieldMatrix<i32>,
    cursor: usize,
    done: usize,
}

impl SchedulerState {
    fn fresh(count: usize) -> Result<Self, SimError> {
        let mut lines = FieldMatrix::new(count, 1)?;
        for (id, slot) in lines.row_mut(0).iter_mut().enumerate() {
            *slot = id as i32;
        }
        Ok(Self {
            lines,
            cursor: 0,
            done: 0,
        })
    }

    fn ids(&self) -> &[i32] {
        self.lines.row(0)
    }
}

/// Hands out each line of a grid exactly once per pass.
#[derive(Debug)]
pub struct LineScheduler {
    count: usize,
    state: Mutex<SchedulerState>,
}

impl LineScheduler {
    /// Creates a scheduler with `count` Pending lines.
    ///
    /// Returns `SimError::InvalidDimensions` for zero lines.
    pub fn new(count: usize) -> Result<Self, SimError> {
        Ok(Self {
            count,
            state: Mutex::new(SchedulerState::fresh(count)?),
        })
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Always false; a scheduler has at least one line.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a fresh pass: every line Pending, cursor at line 0.
    pub fn reset(&self) {
        let mut state = self.lock();
        for (id, slot) in state.lines.row_mut(0).iter_mut().enumerate() {
            *slot = id as i32;
        }
        state.cursor = 0;
        state.done = 0;
    }

    /// Claims the next Pending line in row order, or `None` once exhausted.
    ///
    /// Lines already Done (from a restored checkpoint) are skipped.
    pub fn claim_next(&self) -> Option<usize> {
        let mut state = self.lock();
        while state.cursor < self.count {
            let id = state.cursor;
            state.cursor += 1;
            if state.ids()[id] != DONE {
                return Some(id);
            }
        }
        None
    }

    /// Records completion of `id` and returns the number of Done lines.
    ///
    /// Each count is returned to exactly one caller, the one whose line
    /// completed it. Out-of-range or already Done ids change nothing.
    pub fn mark_done(&self, id: usize) -> usize {
        let mut state = self.lock();
        if id < self.count {
            let slot = state.lines.at_mut(0, id);
            if *slot != DONE {
                *slot = DONE;
                state.done += 1;
            }
        }
        state.done
    }

    pub fn is_done(&self, id: usize) -> bool {
        id < self.count && self.lock().ids()[id] == DONE
    }

    /// True iff every line is Done.
    pub fn is_complete(&self) -> bool {
        self.lock().ids().iter().all(|&v| v == DONE)
    }

    /// Number of Done lines.
    pub fn lines_done(&self) -> usize {
        self.lock().done
    }

    /// Writes the per-line state array to `path`.
    pub fn save_checkpoint(&self, path: &Path) -> Result<(), SimError> {
        self.lock().lines.write(path)
    }

    /// Reloads the per-line state array and resumes at the first Pending line.
    ///
    /// A missing, short, or corrupt file yields `SimError::CheckpointRead`
    /// and leaves the scheduler unchanged.
    pub fn restore_checkpoint(&self, path: &Path) -> Result<(), SimError> {
        let mut staged = FieldMatrix::<i32>::new(self.count, 1)?;
        staged.read(path)?;
        if let Some((pos, &v)) = staged
            .row(0)
            .iter()
            .enumerate()
            .find(|&(pos, &v)| v != DONE && v != pos as i32)
        {
            return Err(SimError::checkpoint_read(
                path,
                format!("line {pos} holds invalid state {v}"),
            ));
        }
        let cursor = staged
            .row(0)
            .iter()
            .position(|&v| v != DONE)
            .unwrap_or(self.count);
        let done = staged.row(0).iter().filter(|&&v| v == DONE).count();

        let mut state = self.lock();
        state.lines = staged;
        state.cursor = cursor;
        state.done = done;
        Ok(())
    }
}
