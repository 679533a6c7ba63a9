//! Headless [`Surface`] backed by an in-memory RGB image.
//!
//! Used when no window is attached: pixels land in an `image::RgbImage` the
//! size of the grid, and the overlay calls (traces, markers) are recorded so
//! callers can inspect what the last frame contained.

use crate::surface::{MarkerShape, Surface};
use image::RgbImage;
use pendulum_core::{DVec2, Rgb, SimError};

/// A source marker drawn on the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: DVec2,
    pub size: f64,
    pub shape: MarkerShape,
    pub color: Rgb,
}

/// A trajectory polyline drawn on the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    pub points: Vec<DVec2>,
    pub color: Rgb,
}

/// In-memory frame buffer with overlay bookkeeping.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: RgbImage,
    frames_presented: u64,
    markers: Vec<Marker>,
    last_strip: Option<Strip>,
}

impl FrameBuffer {
    /// Creates a black `width x height` buffer.
    ///
    /// Returns `SimError::InvalidDimensions` for zero or `u32`-overflowing sizes.
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        let w = u32::try_from(width).map_err(|_| SimError::InvalidDimensions)?;
        let h = u32::try_from(height).map_err(|_| SimError::InvalidDimensions)?;
        if w == 0 || h == 0 {
            return Err(SimError::InvalidDimensions);
        }
        Ok(Self {
            pixels: RgbImage::new(w, h),
            frames_presented: 0,
            markers: Vec::new(),
            last_strip: None,
        })
    }

    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }

    /// Color at `(x, y)`. Panics if out of range.
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let [r, g, b] = self.pixels.get_pixel(x as u32, y as u32).0;
        Rgb::new(r, g, b)
    }

    pub fn image(&self) -> &RgbImage {
        &self.pixels
    }

    /// Number of `draw_frame_buffer` calls so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Markers drawn since the last presented frame.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Most recent trace drawn since the last presented frame.
    pub fn last_strip(&self) -> Option<&Strip> {
        self.last_strip.as_ref()
    }
}

impl Surface for FrameBuffer {
    fn put_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width() && y < self.height() {
            self.pixels
                .put_pixel(x as u32, y as u32, image::Rgb(color.to_array()));
        }
    }

    fn draw_frame_buffer(&mut self) {
        self.frames_presented += 1;
        self.markers.clear();
        self.last_strip = None;
    }

    fn draw_line_strip(&mut self, points: &[DVec2], color: Rgb) {
        self.last_strip = Some(Strip {
            points: points.to_vec(),
            color,
        });
    }

    fn draw_marker(&mut self, position: DVec2, size: f64, shape: MarkerShape, color: Rgb) {
        self.markers.push(Marker {
            position,
            size,
            shape,
            color,
        });
    }
}
