//! Run configuration: a JSON document validated into a typed [`SimConfig`].
//!
//! Layout:
//!
//! ```json
//! {
//!   "field":      { "cols": 800, "rows": 800, "sim_width": 40, "sim_height": 40 },
//!   "simulation": { "min_steps": 100, "max_steps": 20000, "pend_height": 0.3,
//!                   "abort_vel": 0.05, "delta_t": 0.02, "friction": 0.2,
//!                   "color_scheme": "1 - len / max_len" },
//!   "sources": [
//!     { "color": [255, 0, 0], "mult": 1.0, "size": 0.5, "type": "INV_SQR",
//!       "rad": 10, "theta": 90 }
//!   ]
//! }
//! ```
//!
//! Optional keys and their defaults are declared once, on the raw structs.
//! Every other check happens eagerly in [`SimConfig::from_json_str`].

use crate::color::{ColorScheme, Rgb};
use crate::error::SimError;
use crate::grid::Grid;
use crate::source::ForceSource;
use glam::DVec2;
use serde::{de, Deserialize, Deserializer};
use std::path::Path;

/// Worker thread count: a fixed number or one per available processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadCount {
    #[default]
    Auto,
    Fixed(usize),
}

impl ThreadCount {
    /// Concrete thread count; `Auto` asks the OS and falls back to one.
    pub fn resolve(self) -> usize {
        match self {
            ThreadCount::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            ThreadCount::Fixed(n) => n,
        }
    }
}

impl<'de> Deserialize<'de> for ThreadCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(usize),
            Name(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Count(0) => Err(de::Error::custom("thread count must be at least 1")),
            Repr::Count(n) => Ok(ThreadCount::Fixed(n)),
            Repr::Name(s) if s.eq_ignore_ascii_case("auto") => Ok(ThreadCount::Auto),
            Repr::Name(s) => Err(de::Error::custom(format!(
                "expected \"auto\" or a positive integer, got \"{s}\""
            ))),
        }
    }
}

/// Fixed-step integration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParams {
    /// Time step `dt`.
    pub delta_t: f64,
    /// Steps that always run before the capture test may stop a trajectory.
    pub min_steps: usize,
    /// Hard upper bound on steps per trajectory.
    pub max_steps: usize,
    /// Height of the pendulum plane above the source plane.
    pub pend_height: f64,
    /// Speed below which a captured bob counts as settled.
    pub abort_vel: f64,
    /// Velocity-proportional damping coefficient.
    pub friction: f64,
}

impl IntegrationParams {
    /// Checks ranges: `friction > 0`, `delta_t > 0`, `pend_height > 0`,
    /// `max_steps >= max(1, min_steps)` and a finite non-negative abort speed.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.friction > 0.0 && self.friction.is_finite()) {
            return Err(SimError::Config(
                "[simulation]/friction must be greater than zero".into(),
            ));
        }
        if !(self.delta_t > 0.0 && self.delta_t.is_finite()) {
            return Err(SimError::Config(
                "[simulation]/delta_t must be greater than zero".into(),
            ));
        }
        if self.max_steps == 0 {
            return Err(SimError::Config(
                "[simulation]/max_steps must be at least 1".into(),
            ));
        }
        if self.max_steps < self.min_steps {
            return Err(SimError::Config(format!(
                "[simulation]/max_steps ({}) must not be less than min_steps ({})",
                self.max_steps, self.min_steps
            )));
        }
        // A bob level with a source would see an infinite force.
        if !(self.pend_height > 0.0 && self.pend_height.is_finite()) {
            return Err(SimError::Config(format!(
                "[simulation]/pend_height must be greater than zero, got {}",
                self.pend_height
            )));
        }
        if !(self.abort_vel >= 0.0 && self.abort_vel.is_finite()) {
            return Err(SimError::Config(format!(
                "[simulation]/abort_vel must be a non-negative number, got {}",
                self.abort_vel
            )));
        }
        Ok(())
    }
}

/// A fully validated run configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub grid: Grid,
    pub integration: IntegrationParams,
    pub threads: ThreadCount,
    /// Stop the worker pool as soon as every line is done.
    pub batch_mode: bool,
    /// Initial state of the per-column trace display.
    pub show_traces: bool,
    /// Completed lines between periodic checkpoints; `0` disables them.
    pub checkpoint_every: usize,
    pub color_scheme: ColorScheme,
    pub sources: Vec<ForceSource>,
}

impl SimConfig {
    /// Assembles a configuration from already-built parts, with defaults for
    /// the pool settings.
    pub fn new(
        grid: Grid,
        integration: IntegrationParams,
        color_scheme: ColorScheme,
        sources: Vec<ForceSource>,
    ) -> Result<Self, SimError> {
        integration.validate()?;
        if sources.is_empty() {
            return Err(SimError::Config("at least one source is required".into()));
        }
        Ok(Self {
            grid,
            integration,
            threads: ThreadCount::Auto,
            batch_mode: false,
            show_traces: false,
            checkpoint_every: 0,
            color_scheme,
            sources,
        })
    }

    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SimError::Io(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json_str(&text)?;
        log::debug!(
            "loaded {} ({}x{} cells, {} sources, color scheme \"{}\")",
            path.display(),
            config.grid.cols(),
            config.grid.rows(),
            config.sources.len(),
            config.color_scheme.expression()
        );
        Ok(config)
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|e| SimError::Config(e.to_string()))?;
        raw.validate()
    }

    /// Number of worker threads to start.
    pub fn thread_count(&self) -> usize {
        self.threads.resolve()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    field: RawField,
    simulation: RawSimulation,
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    cols: usize,
    rows: usize,
    /// Defaults to `cols`.
    win_width: Option<usize>,
    /// Defaults to `rows`.
    win_height: Option<usize>,
    /// Defaults to `cols`.
    sim_width: Option<f64>,
    /// Defaults to `rows`.
    sim_height: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSimulation {
    #[serde(default)]
    threads: ThreadCount,
    #[serde(default)]
    batch_mode: bool,
    min_steps: usize,
    max_steps: usize,
    pend_height: f64,
    abort_vel: f64,
    delta_t: f64,
    friction: f64,
    color_scheme: String,
    #[serde(default)]
    show_traces: bool,
    #[serde(default)]
    checkpoint_every: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    color: Rgb,
    mult: f64,
    size: f64,
    #[serde(rename = "type")]
    law: String,
    xpos: Option<f64>,
    ypos: Option<f64>,
    rad: Option<f64>,
    /// Degrees.
    theta: Option<f64>,
}

impl RawConfig {
    fn validate(self) -> Result<SimConfig, SimError> {
        let f = &self.field;
        let grid = Grid::new(
            f.cols,
            f.rows,
            f.win_width.unwrap_or(f.cols),
            f.win_height.unwrap_or(f.rows),
            f.sim_width.unwrap_or(f.cols as f64),
            f.sim_height.unwrap_or(f.rows as f64),
        )?;

        let s = &self.simulation;
        let integration = IntegrationParams {
            delta_t: s.delta_t,
            min_steps: s.min_steps,
            max_steps: s.max_steps,
            pend_height: s.pend_height,
            abort_vel: s.abort_vel,
            friction: s.friction,
        };
        let color_scheme = ColorScheme::new(&s.color_scheme)?;

        let sources = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, src)| src.build(i + 1, &grid))
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = SimConfig::new(grid, integration, color_scheme, sources)?;
        config.threads = s.threads;
        config.batch_mode = s.batch_mode;
        config.show_traces = s.show_traces;
        config.checkpoint_every = s.checkpoint_every;
        Ok(config)
    }
}

impl RawSource {
    /// `number` is the 1-based position in the `sources` list, used in messages.
    fn build(&self, number: usize, grid: &Grid) -> Result<ForceSource, SimError> {
        let position = match (self.xpos, self.ypos, self.rad, self.theta) {
            (Some(x), Some(y), _, _) => DVec2::new(x, y),
            (_, _, Some(rad), Some(theta)) => {
                let theta = theta.to_radians();
                grid.center() + rad * DVec2::new(theta.cos(), theta.sin())
            }
            _ => {
                return Err(SimError::Config(format!(
                    "source {number}: required keys \"xpos\" and \"ypos\" or \"rad\" and \"theta\" not found"
                )))
            }
        };
        if !(position.is_finite() && self.mult.is_finite()) {
            return Err(SimError::Config(format!(
                "source {number}: position and mult must be finite"
            )));
        }
        if !(self.size >= 0.0 && self.size.is_finite()) {
            return Err(SimError::Config(format!(
                "source {number}: size must be a non-negative number"
            )));
        }
        ForceSource::with_law_name(&self.law, position, self.size, self.mult, self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ForceLaw;
    use serde_json::{json, Value};

    fn base() -> Value {
        json!({
            "field": { "cols": 40, "rows": 20, "sim_width": 8.0, "sim_height": 4.0 },
            "simulation": {
                "min_steps": 10,
                "max_steps": 500,
                "pend_height": 0.2,
                "abort_vel": 0.05,
                "delta_t": 0.02,
                "friction": 0.3,
                "color_scheme": "1 - len / max_len"
            },
            "sources": [
                { "color": [255, 0, 0], "mult": 1.0, "size": 0.3, "type": "INV_SQR",
                  "xpos": 2.0, "ypos": 1.0 },
                { "color": [0, 255, 0], "mult": 0.5, "size": 0.3, "type": "linear",
                  "rad": 1.0, "theta": 90.0 }
            ]
        })
    }

    fn parse(v: &Value) -> Result<SimConfig, SimError> {
        SimConfig::from_json_str(&v.to_string())
    }

    #[test]
    fn parses_complete_document() {
        let cfg = parse(&base()).unwrap();
        assert_eq!(cfg.grid.cols(), 40);
        assert_eq!(cfg.grid.rows(), 20);
        assert_eq!(cfg.grid.sim_size(), (8.0, 4.0));
        assert_eq!(cfg.integration.max_steps, 500);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.sources[0].law(), ForceLaw::InverseSquare);
        assert_eq!(cfg.sources[1].law(), ForceLaw::Linear);
        assert_eq!(cfg.color_scheme.expression(), "1 - len / max_len");
    }

    #[test]
    fn optional_keys_take_defaults() {
        let cfg = parse(&base()).unwrap();
        assert_eq!(cfg.grid.window_size(), (40, 20));
        assert_eq!(cfg.threads, ThreadCount::Auto);
        assert!(!cfg.batch_mode);
        assert!(!cfg.show_traces);
        assert_eq!(cfg.checkpoint_every, 0);
    }

    #[test]
    fn sim_size_defaults_to_grid_size() {
        let mut v = base();
        v["field"] = json!({ "cols": 16, "rows": 12 });
        let cfg = parse(&v).unwrap();
        assert_eq!(cfg.grid.sim_size(), (16.0, 12.0));
    }

    #[test]
    fn polar_position_is_relative_to_field_center() {
        let cfg = parse(&base()).unwrap();
        let p = cfg.sources[1].position();
        assert!((p - DVec2::new(4.0, 3.0)).length() < 1e-12, "got {p}");
    }

    #[test]
    fn thread_count_accepts_number_and_auto() {
        let mut v = base();
        v["simulation"]["threads"] = json!(3);
        assert_eq!(parse(&v).unwrap().threads, ThreadCount::Fixed(3));
        v["simulation"]["threads"] = json!("AUTO");
        assert_eq!(parse(&v).unwrap().threads, ThreadCount::Auto);
    }

    #[test]
    fn thread_count_rejects_zero_and_junk() {
        let mut v = base();
        v["simulation"]["threads"] = json!(0);
        assert!(matches!(parse(&v), Err(SimError::Config(_))));
        v["simulation"]["threads"] = json!("many");
        assert!(matches!(parse(&v), Err(SimError::Config(_))));
    }

    #[test]
    fn auto_thread_count_resolves_to_at_least_one() {
        assert!(ThreadCount::Auto.resolve() >= 1);
        assert_eq!(ThreadCount::Fixed(5).resolve(), 5);
    }

    #[test]
    fn non_positive_friction_is_config_error() {
        for friction in [0.0, -0.1] {
            let mut v = base();
            v["simulation"]["friction"] = json!(friction);
            let err = parse(&v).unwrap_err();
            assert!(
                matches!(err, SimError::Config(ref m) if m.contains("friction")),
                "got {err}"
            );
        }
    }

    #[test]
    fn non_positive_pend_height_is_config_error() {
        for height in [0.0, -0.5] {
            let mut v = base();
            v["simulation"]["pend_height"] = json!(height);
            let err = parse(&v).unwrap_err();
            assert!(
                matches!(err, SimError::Config(ref m) if m.contains("pend_height")),
                "got {err}"
            );
        }
    }

    #[test]
    fn max_steps_below_min_steps_is_config_error() {
        let mut v = base();
        v["simulation"]["max_steps"] = json!(5);
        let err = parse(&v).unwrap_err();
        assert!(matches!(err, SimError::Config(ref m) if m.contains("min_steps")));
    }

    #[test]
    fn empty_color_scheme_is_config_error() {
        let mut v = base();
        v["simulation"]["color_scheme"] = json!("");
        assert!(matches!(parse(&v), Err(SimError::Config(_))));
    }

    #[test]
    fn unparsable_color_scheme_is_evaluator_error() {
        let mut v = base();
        v["simulation"]["color_scheme"] = json!("len +* 2");
        assert!(matches!(parse(&v), Err(SimError::Evaluator { .. })));
    }

    #[test]
    fn unknown_law_is_rejected() {
        let mut v = base();
        v["sources"][0]["type"] = json!("INV_CUBE");
        assert!(matches!(parse(&v), Err(SimError::UnknownForceLaw(_))));
    }

    #[test]
    fn source_without_position_is_config_error() {
        let mut v = base();
        v["sources"][0] = json!({ "color": [1, 2, 3], "mult": 1.0, "size": 0.1, "type": "INV" });
        let err = parse(&v).unwrap_err();
        assert!(matches!(err, SimError::Config(ref m) if m.contains("source 1")), "got {err}");
    }

    #[test]
    fn missing_required_key_is_config_error() {
        let mut v = base();
        v["simulation"].as_object_mut().unwrap().remove("delta_t");
        let err = parse(&v).unwrap_err();
        assert!(matches!(err, SimError::Config(ref m) if m.contains("delta_t")), "got {err}");
    }

    #[test]
    fn unknown_key_is_config_error() {
        let mut v = base();
        v["simulation"]["frction"] = json!(0.2);
        assert!(matches!(parse(&v), Err(SimError::Config(_))));
    }

    #[test]
    fn empty_source_list_is_config_error() {
        let mut v = base();
        v["sources"] = json!([]);
        assert!(matches!(parse(&v), Err(SimError::Config(_))));
    }

    #[test]
    fn zero_grid_is_invalid_dimensions() {
        let mut v = base();
        v["field"]["cols"] = json!(0);
        assert!(matches!(parse(&v), Err(SimError::InvalidDimensions)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, base().to_string()).unwrap();
        assert_eq!(SimConfig::load(&path).unwrap().sources.len(), 2);
    }
}
