//! Pendulum integration and the shared result fields.
//!
//! A [`SimulationEngine`] owns the per-cell outcome of every start position
//! (`index`: nearest source at rest, `length`: path length walked) and
//! the running maximum of `length` that the color scheme normalizes with.
//! Any number of workers may call [`SimulationEngine::calc`] concurrently.

use crate::scheduler::LineScheduler;
use pendulum_core::{
    ColorScheme, DVec2, FieldMatrix, ForceSource, Grid, IntegrationParams, SimConfig, SimError,
    UNPROCESSED,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A trace point is recorded every this many integration steps.
pub const TRACE_STRIDE: usize = 10;

/// The two result fields, `cols x rows` each.
#[derive(Debug)]
pub struct Fields {
    pub index: FieldMatrix<i32>,
    pub length: FieldMatrix<f64>,
}

impl Fields {
    fn new(grid: &Grid) -> Result<Self, SimError> {
        let mut fields = Self {
            index: FieldMatrix::new(grid.cols(), grid.rows())?,
            length: FieldMatrix::new(grid.cols(), grid.rows())?,
        };
        fields.clear();
        Ok(fields)
    }

    /// Marks every cell unprocessed.
    pub fn clear(&mut self) {
        self.index.fill(UNPROCESSED);
        self.length.fill(0.0);
    }
}

/// Outcome of one pendulum run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// Source nearest to the bob at the last integrated step.
    pub source: Option<usize>,
    /// Sum of per-step speeds.
    pub length: f64,
    /// Integration steps performed.
    pub steps: usize,
}

/// Integrator and result store shared by all workers.
#[derive(Debug)]
pub struct SimulationEngine {
    grid: Grid,
    params: IntegrationParams,
    sources: Vec<ForceSource>,
    color_scheme: ColorScheme,
    fields: RwLock<Fields>,
    scheduler: LineScheduler,
    /// `f64` bits of the largest length stored so far.
    max_len: AtomicU64,
    renormalize: AtomicBool,
}

impl SimulationEngine {
    pub fn new(config: &SimConfig) -> Result<Self, SimError> {
        Self::from_parts(
            config.grid,
            config.integration,
            config.sources.clone(),
            config.color_scheme.clone(),
        )
    }

    /// Builds an engine without going through a [`SimConfig`].
    ///
    /// Returns `SimError::Config` for an empty source list or invalid
    /// integration parameters.
    pub fn from_parts(
        grid: Grid,
        params: IntegrationParams,
        sources: Vec<ForceSource>,
        color_scheme: ColorScheme,
    ) -> Result<Self, SimError> {
        params.validate()?;
        if sources.is_empty() {
            return Err(SimError::Config("at least one source is required".into()));
        }
        Ok(Self {
            fields: RwLock::new(Fields::new(&grid)?),
            scheduler: LineScheduler::new(grid.rows())?,
            grid,
            params,
            sources,
            color_scheme,
            max_len: AtomicU64::new(0.0_f64.to_bits()),
            renormalize: AtomicBool::new(false),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &IntegrationParams {
        &self.params
    }

    pub fn sources(&self) -> &[ForceSource] {
        &self.sources
    }

    pub fn color_scheme(&self) -> &ColorScheme {
        &self.color_scheme
    }

    pub fn scheduler(&self) -> &LineScheduler {
        &self.scheduler
    }

    /// Read access to the result fields.
    pub fn fields(&self) -> RwLockReadGuard<'_, Fields> {
        self.fields.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn fields_mut(&self) -> RwLockWriteGuard<'_, Fields> {
        self.fields.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Largest length stored so far (0 before any cell is computed).
    pub fn max_length(&self) -> f64 {
        f64::from_bits(self.max_len.load(Ordering::Acquire))
    }

    /// Returns and clears the "maximum grew, redraw everything" flag.
    pub fn take_renormalize(&self) -> bool {
        self.renormalize.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn request_renormalize(&self) {
        self.renormalize.store(true, Ordering::Release);
    }

    /// Raises the running maximum to `len` if larger.
    ///
    /// Concurrent callers never lose an update; the renormalize flag is set
    /// whenever the maximum actually grew.
    fn raise_max_length(&self, len: f64) {
        let raised = self
            .max_len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (len > f64::from_bits(bits)).then(|| len.to_bits())
            })
            .is_ok();
        if raised {
            self.request_renormalize();
        }
    }

    pub(crate) fn set_max_length(&self, len: f64) {
        self.max_len.store(len.to_bits(), Ordering::Release);
    }

    /// Clears both fields, the running maximum and the line schedule.
    pub fn reset(&self) {
        self.fields_mut().clear();
        self.set_max_length(0.0);
        self.renormalize.store(false, Ordering::Release);
        self.scheduler.reset();
    }

    /// Integrates one pendulum with the Beeman scheme.
    ///
    /// The run stops after `max_steps` steps, or once past `min_steps` the
    /// bob sits inside some source's capture radius below `abort_vel`; the
    /// step that detects this still completes. When `trace` is given it is
    /// cleared and receives the position every [`TRACE_STRIDE`] steps.
    pub fn trajectory(
        &self,
        start_pos: DVec2,
        start_vel: DVec2,
        mut trace: Option<&mut Vec<DVec2>>,
    ) -> Trajectory {
        let p = &self.params;
        let dt = p.delta_t;
        let dt2 = dt * dt;

        let mut pos = start_pos;
        let mut vel = start_vel;
        let mut acc = DVec2::ZERO;
        let mut acc_prev = DVec2::ZERO;
        let mut length = 0.0;
        let mut nearest = None;
        let mut steps = 0;

        if let Some(points) = trace.as_deref_mut() {
            points.clear();
        }

        let mut running = true;
        while running && steps < p.max_steps {
            let ct = steps;
            pos += vel * dt + dt2 * (acc * (2.0 / 3.0) - acc_prev * (1.0 / 6.0));

            if ct % TRACE_STRIDE == 0 {
                if let Some(points) = trace.as_deref_mut() {
                    points.push(pos);
                }
            }

            let mut acc_next = DVec2::ZERO;
            let mut nearest_dist = f64::MAX;
            for (i, src) in self.sources.iter().enumerate() {
                let dist = src.distance(pos, p.pend_height);
                if dist < nearest_dist {
                    nearest_dist = dist;
                    nearest = Some(i);
                }

                let r = pos - src.position();
                acc_next -= src.query_force(r, dist);

                if ct > p.min_steps && r.length() < src.size() && vel.length() < p.abort_vel {
                    running = false;
                }
            }
            acc_next -= vel * p.friction;

            vel += dt * (acc_next * (1.0 / 3.0) + acc * (5.0 / 6.0) - acc_prev * (1.0 / 6.0));
            acc_prev = acc;
            acc = acc_next;

            length += vel.length();
            steps += 1;
        }

        Trajectory {
            source: nearest,
            length,
            steps,
        }
    }

    /// Runs one pendulum from rest at `start_pos` and stores the outcome.
    ///
    /// The result lands in the cell nearest `start_pos`; a start outside the
    /// grid stores nothing and returns `None`.
    pub fn calc(
        &self,
        start_pos: DVec2,
        start_vel: DVec2,
        trace: Option<&mut Vec<DVec2>>,
    ) -> Option<usize> {
        let run = self.trajectory(start_pos, start_vel, trace);
        let (col, row) = self.grid.model_to_grid(start_pos)?;
        {
            let mut fields = self.fields_mut();
            *fields.index.at_mut(row, col) = run.source.map_or(UNPROCESSED, |s| s as i32);
            *fields.length.at_mut(row, col) = run.length;
        }
        self.raise_max_length(run.length);
        run.source
    }

    /// Computes the cell at `(col, row)` from rest.
    pub fn compute_cell(
        &self,
        col: usize,
        row: usize,
        trace: Option<&mut Vec<DVec2>>,
    ) -> Option<usize> {
        self.calc(self.grid.grid_to_model(col, row), DVec2::ZERO, trace)
    }

    /// Total potential energy of the bob at `pos`.
    pub fn potential_at(&self, pos: DVec2) -> f64 {
        self.sources
            .iter()
            .map(|s| s.potential(s.distance(pos, self.params.pend_height)))
            .sum()
    }
}
