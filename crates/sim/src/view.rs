//! A simulation engine bound to a drawing surface.
//!
//! Lock order is paint lock, then fields. Workers computing cells only take
//! the fields lock, so the preview never blocks integration for long.

use crate::checkpoint::{CheckpointPaths, RestoreOutcome};
use crate::engine::{SimulationEngine, Trajectory};
use pendulum_core::{DVec2, ForceLaw, Rgb, SimConfig, SimError};
use pendulum_render::pixel::shade_cell;
use pendulum_render::{Display, MarkerShape, Surface};
use std::path::Path;

/// Smallest cross drawn for a linear source, in grid pixels.
const MIN_CROSS_SIZE: f64 = 5.0;

pub struct Simulation<S> {
    engine: SimulationEngine,
    display: Display<S>,
}

impl<S: Surface> Simulation<S> {
    pub fn new(config: &SimConfig, surface: S) -> Result<Self, SimError> {
        Ok(Self::with_engine(SimulationEngine::new(config)?, surface))
    }

    pub fn with_engine(engine: SimulationEngine, surface: S) -> Self {
        Self {
            engine,
            display: Display::new(surface),
        }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn display(&self) -> &Display<S> {
        &self.display
    }

    /// Pushes a finished line to the surface.
    ///
    /// If the running maximum grew since the last refresh, every line is
    /// redrawn with the new normalization instead.
    pub fn refresh_line(&self, row: usize) -> Result<(), SimError> {
        let mut surface = self.display.paint();
        if self.engine.take_renormalize() {
            for y in 0..self.engine.grid().rows() {
                self.draw_line(&mut *surface, y)?;
            }
        } else {
            self.draw_line(&mut *surface, row)?;
        }
        Ok(())
    }

    /// Redraws every line and presents the result with source markers.
    pub fn redraw_all(&self) -> Result<(), SimError> {
        let mut surface = self.display.paint();
        for y in 0..self.engine.grid().rows() {
            self.draw_line(&mut *surface, y)?;
        }
        self.draw_model_on(&mut *surface);
        Ok(())
    }

    fn draw_line(&self, surface: &mut S, row: usize) -> Result<(), SimError> {
        let fields = self.engine.fields();
        let max_len = self.engine.max_length();
        let sources = self.engine.sources();
        let scheme = self.engine.color_scheme();
        for (col, (&idx, &len)) in fields
            .index
            .row(row)
            .iter()
            .zip(fields.length.row(row))
            .enumerate()
        {
            if let Some(color) = shade_cell(idx, len, max_len, sources, scheme)? {
                surface.put_pixel(col, row, color);
            }
        }
        Ok(())
    }

    /// Presents the frame buffer and draws the source markers on top.
    pub fn draw_model(&self) {
        self.draw_model_on(&mut *self.display.paint());
    }

    fn draw_model_on(&self, surface: &mut S) {
        surface.draw_frame_buffer();
        let grid = self.engine.grid();
        let scale = grid.cols() as f64 / grid.sim_size().0;
        for src in self.engine.sources() {
            let at = grid.model_to_grid_f(src.position());
            let size = src.size() * scale;
            match src.law() {
                ForceLaw::Linear => surface.draw_marker(
                    at,
                    size.max(MIN_CROSS_SIZE),
                    MarkerShape::Cross,
                    src.color(),
                ),
                _ => surface.draw_marker(at, size, MarkerShape::Circle, src.color()),
            }
        }
    }

    /// Draws the model with one trajectory on top, in the color of the
    /// source it ended at (white if none).
    pub fn draw_trace(&self, trace: &[DVec2], source: Option<usize>) {
        let grid = self.engine.grid();
        let color = source
            .and_then(|i| self.engine.sources().get(i))
            .map_or(Rgb::WHITE, |s| s.color());
        let points: Vec<DVec2> = trace.iter().map(|&p| grid.model_to_grid_f(p)).collect();

        let mut surface = self.display.paint();
        self.draw_model_on(&mut *surface);
        surface.draw_line_strip(&points, color);
    }

    /// Runs one pendulum from rest under window pixel `(x, y)` and draws
    /// its path. The result fields are left untouched.
    pub fn probe(&self, x: i32, y: i32) -> Trajectory {
        let start = self.engine.grid().window_to_model(x, y);
        let mut trace = Vec::new();
        let run = self.engine.trajectory(start, DVec2::ZERO, Some(&mut trace));
        self.draw_trace(&trace, run.source);
        run
    }

    /// Restores the engine from `paths` and repaints what was reloaded.
    pub fn restore(&self, paths: &CheckpointPaths) -> Result<RestoreOutcome, SimError> {
        let outcome = self.engine.restore(paths)?;
        if let RestoreOutcome::Resumed { .. } = outcome {
            self.engine.take_renormalize();
            self.redraw_all()?;
        } else {
            self.draw_model();
        }
        Ok(outcome)
    }

    pub fn dump(&self, paths: &CheckpointPaths) -> Result<(), SimError> {
        self.engine.dump(paths)
    }

    pub fn render_snapshot(&self, path: &Path) -> Result<(), SimError> {
        self.engine.render_snapshot(path)
    }
}
