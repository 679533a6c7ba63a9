//! Shading of computed cells into RGB pixels.
//!
//! This module is always available (no feature gate) so that both the live
//! refresh path and the `png` snapshot path share the same color mapping.

use pendulum_core::{ColorScheme, FieldMatrix, ForceSource, Rgb, SimError};

/// Color of one cell, or `None` if the cell is unprocessed.
///
/// Returns `SimError::IndexMismatch` when `index` does not name one of
/// `sources` (a checkpoint taken with a different configuration), and
/// `SimError::Evaluator` when the color scheme fails.
pub fn shade_cell(
    index: i32,
    len: f64,
    max_len: f64,
    sources: &[ForceSource],
    scheme: &ColorScheme,
) -> Result<Option<Rgb>, SimError> {
    if index < 0 {
        return Ok(None);
    }
    let source = sources
        .get(index as usize)
        .ok_or(SimError::IndexMismatch {
            index,
            count: sources.len(),
        })?;
    scheme.shade(source.color(), len, max_len).map(Some)
}

/// Maps both result fields to a packed RGB8 buffer (`cols * rows * 3` bytes).
///
/// Unprocessed cells are black.
pub fn fields_to_rgb(
    index: &FieldMatrix<i32>,
    length: &FieldMatrix<f64>,
    max_len: f64,
    sources: &[ForceSource],
    scheme: &ColorScheme,
) -> Result<Vec<u8>, SimError> {
    let mut rgb = Vec::with_capacity(index.data().len() * 3);
    for (&idx, &len) in index.data().iter().zip(length.data()) {
        let color = shade_cell(idx, len, max_len, sources, scheme)?.unwrap_or(Rgb::BLACK);
        rgb.extend_from_slice(&color.to_array());
    }
    Ok(rgb)
}
