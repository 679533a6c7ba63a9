//! The drawing interface consumed by the simulation.
//!
//! The simulation never talks to a window directly. It draws onto a
//! [`Surface`], always through the scoped paint lock handed out by
//! [`Display::paint`], so that a sequence of draw calls from one worker is
//! never interleaved with another's.

use pendulum_core::{DVec2, Rgb};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Marker glyph used to draw a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Cross,
    Circle,
}

/// Drawing primitives, in grid pixel coordinates.
///
/// `put_pixel` writes into an off-screen frame buffer; `draw_frame_buffer`
/// presents it. Line strips and markers are drawn on top of the presented
/// frame.
pub trait Surface: Send {
    fn put_pixel(&mut self, x: usize, y: usize, color: Rgb);
    fn draw_frame_buffer(&mut self);
    fn draw_line_strip(&mut self, points: &[DVec2], color: Rgb);
    fn draw_marker(&mut self, position: DVec2, size: f64, shape: MarkerShape, color: Rgb);
}

/// A surface shared between threads behind the paint lock.
#[derive(Debug, Default)]
pub struct Display<S> {
    surface: Mutex<S>,
}

/// Scoped paint lock; drawing is allowed while it is alive.
pub type PaintLock<'a, S> = MutexGuard<'a, S>;

impl<S: Surface> Display<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Mutex::new(surface),
        }
    }

    /// Acquires the paint lock.
    ///
    /// A worker that panicked while drawing leaves at worst a half-drawn
    /// frame, so a poisoned lock is recovered rather than propagated.
    pub fn paint(&self) -> PaintLock<'_, S> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consumes the display and returns the surface.
    pub fn into_inner(self) -> S {
        self.surface
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
