#![deny(unsafe_code)]
//! Rendering side of the pendulum engine.
//!
//! The simulation draws through the [`Surface`] trait under the paint lock
//! of a [`Display`]. [`FrameBuffer`] is the bundled headless surface. Cell
//! shading lives in [`pixel`] and PNG export in [`snapshot`].

pub mod frame;
pub mod pixel;
pub mod surface;

#[cfg(feature = "png")]
pub mod snapshot;

pub use frame::{FrameBuffer, Marker, Strip};
pub use surface::{Display, MarkerShape, PaintLock, Surface};
