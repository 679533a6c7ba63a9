//! Coordinate spaces of a simulation run.
//!
//! Three spaces are linearly related:
//! - **model**: physical coordinates, `[0, sim_width) x [0, sim_height)`
//! - **grid**: integer cells of the result fields, `cols x rows`
//! - **window**: preview pixels, `win_width x win_height`

use crate::error::SimError;
use glam::DVec2;

/// Grid, window and physical extents of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    win_width: usize,
    win_height: usize,
    sim_width: f64,
    sim_height: f64,
}

impl Grid {
    /// Returns `SimError::InvalidDimensions` if any integer extent is zero and
    /// `SimError::Config` if a physical extent is not positive and finite.
    pub fn new(
        cols: usize,
        rows: usize,
        win_width: usize,
        win_height: usize,
        sim_width: f64,
        sim_height: f64,
    ) -> Result<Self, SimError> {
        if cols == 0 || rows == 0 || win_width == 0 || win_height == 0 {
            return Err(SimError::InvalidDimensions);
        }
        for (name, v) in [("sim_width", sim_width), ("sim_height", sim_height)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(SimError::Config(format!(
                    "[field]/{name} must be a positive number, got {v}"
                )));
            }
        }
        Ok(Self {
            cols,
            rows,
            win_width,
            win_height,
            sim_width,
            sim_height,
        })
    }

    /// A grid whose window and physical extents equal its cell counts.
    pub fn square_cells(cols: usize, rows: usize) -> Result<Self, SimError> {
        Self::new(cols, rows, cols, rows, cols as f64, rows as f64)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Preview window size in pixels, `(width, height)`.
    pub fn window_size(&self) -> (usize, usize) {
        (self.win_width, self.win_height)
    }

    /// Physical field size, `(width, height)`.
    pub fn sim_size(&self) -> (f64, f64) {
        (self.sim_width, self.sim_height)
    }

    /// Center of the physical field.
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.sim_width / 2.0, self.sim_height / 2.0)
    }

    /// Physical position of grid cell `(col, row)`.
    pub fn grid_to_model(&self, col: usize, row: usize) -> DVec2 {
        DVec2::new(
            col as f64 / self.cols as f64 * self.sim_width,
            row as f64 / self.rows as f64 * self.sim_height,
        )
    }

    /// Physical position under window pixel `(x, y)`.
    pub fn window_to_model(&self, x: i32, y: i32) -> DVec2 {
        DVec2::new(
            x as f64 / self.win_width as f64 * self.sim_width,
            y as f64 / self.win_height as f64 * self.sim_height,
        )
    }

    /// Unrounded grid coordinates of a physical position.
    pub fn model_to_grid_f(&self, pos: DVec2) -> DVec2 {
        DVec2::new(
            pos.x / self.sim_width * self.cols as f64,
            pos.y / self.sim_height * self.rows as f64,
        )
    }

    /// Grid cell `(col, row)` nearest to `pos`, or `None` outside the grid.
    pub fn model_to_grid(&self, pos: DVec2) -> Option<(usize, usize)> {
        let g = self.model_to_grid_f(pos).round();
        if !(g.x >= 0.0 && g.y >= 0.0) {
            return None;
        }
        let (col, row) = (g.x as usize, g.y as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(200, 100, 400, 300, 20.0, 10.0).unwrap()
    }

    #[test]
    fn new_rejects_zero_extents() {
        assert!(matches!(
            Grid::new(0, 10, 10, 10, 1.0, 1.0),
            Err(SimError::InvalidDimensions)
        ));
        assert!(matches!(
            Grid::new(10, 10, 10, 0, 1.0, 1.0),
            Err(SimError::InvalidDimensions)
        ));
    }

    #[test]
    fn new_rejects_non_positive_sim_size() {
        assert!(matches!(
            Grid::new(10, 10, 10, 10, 0.0, 1.0),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            Grid::new(10, 10, 10, 10, 1.0, f64::NAN),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn grid_to_model_scales_linearly() {
        let p = grid().grid_to_model(100, 25);
        assert_eq!(p, DVec2::new(10.0, 2.5));
    }

    #[test]
    fn window_to_model_scales_linearly() {
        let p = grid().window_to_model(200, 150);
        assert_eq!(p, DVec2::new(10.0, 5.0));
    }

    #[test]
    fn model_to_grid_inverts_grid_to_model() {
        let g = grid();
        for (col, row) in [(0, 0), (17, 3), (199, 99), (100, 50)] {
            assert_eq!(g.model_to_grid(g.grid_to_model(col, row)), Some((col, row)));
        }
    }

    #[test]
    fn model_to_grid_rejects_outside_positions() {
        let g = grid();
        assert_eq!(g.model_to_grid(DVec2::new(-1.0, 1.0)), None);
        assert_eq!(g.model_to_grid(DVec2::new(1.0, 10.0)), None);
        assert_eq!(g.model_to_grid(DVec2::new(20.0, 1.0)), None);
        assert_eq!(g.model_to_grid(DVec2::new(f64::NAN, 1.0)), None);
    }

    #[test]
    fn center_is_half_the_sim_size() {
        assert_eq!(grid().center(), DVec2::new(10.0, 5.0));
    }

    #[test]
    fn square_cells_uses_cell_counts_everywhere() {
        let g = Grid::square_cells(4, 4).unwrap();
        assert_eq!(g.window_size(), (4, 4));
        assert_eq!(g.sim_size(), (4.0, 4.0));
        assert_eq!(g.grid_to_model(3, 1), DVec2::new(3.0, 1.0));
    }
}
