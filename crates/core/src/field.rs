//! Dense two-dimensional result buffers with raw binary persistence.
//!
//! A `FieldMatrix<T>` stores `rows * cols` values in row-major order. The
//! engine keeps two of them: the nearest-source index per cell (`i32`) and
//! the accumulated trajectory length per cell (`f64`). Both can be dumped to
//! and reloaded from headerless native-endian files for checkpointing.

use crate::error::SimError;
use bytemuck::Pod;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A row-major `rows x cols` matrix of plain numeric cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatrix<T> {
    cols: usize,
    rows: usize,
    data: Vec<T>,
}

impl<T: Pod + PartialOrd> FieldMatrix<T> {
    /// Creates a zero-filled matrix of `cols x rows` cells.
    ///
    /// Returns `SimError::InvalidDimensions` if either dimension is zero
    /// or if `cols * rows` overflows `usize`.
    pub fn new(cols: usize, rows: usize) -> Result<Self, SimError> {
        let len = checked_len(cols, rows)?;
        Ok(Self {
            cols,
            rows,
            data: vec![T::zeroed(); len],
        })
    }

    /// Reallocates the matrix to `cols x rows` and zero-fills it.
    ///
    /// Prior contents are discarded even when the shape does not change.
    pub fn resize(&mut self, cols: usize, rows: usize) -> Result<(), SimError> {
        let len = checked_len(cols, rows)?;
        self.cols = cols;
        self.rows = rows;
        self.data = vec![T::zeroed(); len];
        Ok(())
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Read-only access to the underlying row-major data.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Value at `(row, col)`. Panics if out of range.
    pub fn at(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Mutable reference to the cell at `(row, col)`. Panics if out of range.
    pub fn at_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }

    /// One line of the matrix.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Mutable access to one line of the matrix.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Largest element by `PartialOrd`. NaN cells never win; an all-NaN
    /// matrix returns its first cell.
    pub fn max(&self) -> T {
        let mut ordered = self
            .data
            .iter()
            .copied()
            .filter(|v| v.partial_cmp(v).is_some());
        let first = ordered.next().unwrap_or(self.data[0]);
        ordered.fold(first, |acc, v| if v > acc { v } else { acc })
    }

    /// Writes the raw buffer to `path` with no header.
    pub fn write(&self, path: &Path) -> Result<(), SimError> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.data);
        let mut file = File::create(path).map_err(|e| SimError::checkpoint_write(path, e))?;
        file.write_all(bytes)
            .map_err(|e| SimError::checkpoint_write(path, e))
    }

    /// Loads a raw buffer previously produced by [`FieldMatrix::write`].
    ///
    /// The file must hold exactly `rows * cols` elements of `T`; any other
    /// length is reported as `SimError::CheckpointRead` and the matrix is
    /// left untouched.
    pub fn read(&mut self, path: &Path) -> Result<(), SimError> {
        let mut file = File::open(path).map_err(|e| SimError::checkpoint_read(path, e))?;
        let expected = std::mem::size_of_val(self.data.as_slice()) as u64;
        let actual = file
            .metadata()
            .map_err(|e| SimError::checkpoint_read(path, e))?
            .len();
        if actual != expected {
            return Err(SimError::checkpoint_read(
                path,
                format!("expected {expected} bytes, found {actual}"),
            ));
        }
        let mut staged = vec![T::zeroed(); self.data.len()];
        file.read_exact(bytemuck::cast_slice_mut(&mut staged))
            .map_err(|e| SimError::checkpoint_read(path, e))?;
        self.data = staged;
        Ok(())
    }
}

fn checked_len(cols: usize, rows: usize) -> Result<usize, SimError> {
    if cols == 0 || rows == 0 {
        return Err(SimError::InvalidDimensions);
    }
    cols.checked_mul(rows).ok_or(SimError::InvalidDimensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Construction --

    #[test]
    fn new_creates_zero_filled_matrix() {
        let m = FieldMatrix::<f64>::new(4, 3).unwrap();
        assert_eq!(m.cols(), 4);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.data().len(), 12);
        assert!(m.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn new_with_zero_dimension_returns_error() {
        assert!(matches!(
            FieldMatrix::<i32>::new(0, 5),
            Err(SimError::InvalidDimensions)
        ));
        assert!(matches!(
            FieldMatrix::<i32>::new(5, 0),
            Err(SimError::InvalidDimensions)
        ));
    }

    #[test]
    fn new_with_overflowing_dimensions_returns_error() {
        assert!(FieldMatrix::<i32>::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn resize_discards_contents() {
        let mut m = FieldMatrix::<i32>::new(2, 2).unwrap();
        m.fill(7);
        m.resize(3, 5).unwrap();
        assert_eq!(m.cols(), 3);
        assert_eq!(m.rows(), 5);
        assert!(m.data().iter().all(|&v| v == 0));
    }

    // -- Access --

    #[test]
    fn at_mut_writes_row_major_cell() {
        let mut m = FieldMatrix::<i32>::new(4, 3).unwrap();
        *m.at_mut(2, 1) = 5;
        assert_eq!(m.at(2, 1), 5);
        assert_eq!(m.data()[2 * 4 + 1], 5);
    }

    #[test]
    fn row_returns_single_line() {
        let mut m = FieldMatrix::<i32>::new(3, 2).unwrap();
        m.row_mut(1).copy_from_slice(&[1, 2, 3]);
        assert_eq!(m.row(0), &[0, 0, 0]);
        assert_eq!(m.row(1), &[1, 2, 3]);
    }

    #[test]
    fn fill_sets_sentinel_everywhere() {
        let mut m = FieldMatrix::<i32>::new(3, 3).unwrap();
        m.fill(-1);
        assert!(m.data().iter().all(|&v| v == -1));
    }

    #[test]
    fn max_finds_largest_value() {
        let mut m = FieldMatrix::<f64>::new(3, 2).unwrap();
        *m.at_mut(1, 2) = 42.5;
        *m.at_mut(0, 0) = 3.0;
        assert_eq!(m.max(), 42.5);
    }

    #[test]
    fn max_ignores_nan() {
        let mut m = FieldMatrix::<f64>::new(2, 1).unwrap();
        *m.at_mut(0, 1) = f64::NAN;
        assert_eq!(m.max(), 0.0);
    }

    #[test]
    fn max_skips_leading_nan() {
        let mut m = FieldMatrix::<f64>::new(2, 1).unwrap();
        *m.at_mut(0, 0) = f64::NAN;
        *m.at_mut(0, 1) = 3.0;
        assert_eq!(m.max(), 3.0);
    }

    // -- Persistence --

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.len");

        let mut m = FieldMatrix::<f64>::new(5, 4).unwrap();
        for (i, v) in m.row_mut(2).iter_mut().enumerate() {
            *v = i as f64 * 1.25;
        }
        m.write(&path).unwrap();

        let mut loaded = FieldMatrix::<f64>::new(5, 4).unwrap();
        loaded.read(&path).unwrap();
        assert_eq!(loaded, m);
    }

    #[test]
    fn written_file_has_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.idx");
        FieldMatrix::<i32>::new(6, 7).unwrap().write(&path).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, (6 * 7 * std::mem::size_of::<i32>()) as u64);
    }

    #[test]
    fn read_missing_file_is_checkpoint_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = FieldMatrix::<i32>::new(2, 2).unwrap();
        let err = m.read(&dir.path().join("absent.idx")).unwrap_err();
        assert!(matches!(err, SimError::CheckpointRead { .. }));
    }

    #[test]
    fn read_wrong_size_leaves_matrix_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.idx");
        FieldMatrix::<i32>::new(2, 2).unwrap().write(&path).unwrap();

        let mut m = FieldMatrix::<i32>::new(3, 3).unwrap();
        m.fill(-1);
        let err = m.read(&path).unwrap_err();
        assert!(matches!(err, SimError::CheckpointRead { .. }));
        assert!(m.data().iter().all(|&v| v == -1));
    }

    #[test]
    fn write_into_missing_directory_is_checkpoint_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let m = FieldMatrix::<i32>::new(2, 2).unwrap();
        let err = m.write(&dir.path().join("nope").join("x.idx")).unwrap_err();
        assert!(matches!(err, SimError::CheckpointWrite { .. }));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip_preserves_every_cell(
                cols in 1_usize..=16,
                rows in 1_usize..=16,
                seed in proptest::collection::vec(-1_i32..8, 1..=256),
            ) {
                let dir = tempfile::tempdir().unwrap();
                let path = dir.path().join("cells.idx");

                let mut m = FieldMatrix::<i32>::new(cols, rows).unwrap();
                for (i, cell) in m.row_mut(0).iter_mut().enumerate() {
                    *cell = seed[i % seed.len()];
                }
                for r in 1..rows {
                    *m.at_mut(r, r % cols) = seed[r % seed.len()];
                }
                m.write(&path).unwrap();

                let mut loaded = FieldMatrix::<i32>::new(cols, rows).unwrap();
                loaded.read(&path).unwrap();
                prop_assert_eq!(loaded.data(), m.data());
            }
        }
    }
}
