//! PNG rendering of the result fields.
//!
//! This module is feature-gated behind `png` (default on). The pixel
//! conversion itself lives in [`crate::pixel`] (always available).

use pendulum_core::{ColorScheme, FieldMatrix, ForceSource, SimError};
use std::path::Path;

use crate::pixel::fields_to_rgb;

/// Writes the shaded fields as a PNG image the size of the grid.
///
/// Returns `SimError::InvalidDimensions` if the grid overflows `u32`,
/// `SimError::IndexMismatch`/`SimError::Evaluator` from shading, or
/// `SimError::Io` on write failure.
pub fn write_png(
    index: &FieldMatrix<i32>,
    length: &FieldMatrix<f64>,
    max_len: f64,
    sources: &[ForceSource],
    scheme: &ColorScheme,
    path: &Path,
) -> Result<(), SimError> {
    let rgb = fields_to_rgb(index, length, max_len, sources, scheme)?;
    let w = u32::try_from(index.cols()).map_err(|_| SimError::InvalidDimensions)?;
    let h = u32::try_from(index.rows()).map_err(|_| SimError::InvalidDimensions)?;
    let img = image::RgbImage::from_raw(w, h, rgb)
        .ok_or_else(|| SimError::Io("RGB buffer size mismatch".into()))?;
    img.save(path)
        .map_err(|e| SimError::Io(format!("cannot write {}: {e}", path.display())))?;
    log::debug!("snapshot written to {}", path.display());
    Ok(())
}
