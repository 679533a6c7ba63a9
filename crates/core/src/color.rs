//! Source colors and the expression-driven color scheme.
//!
//! Every computed cell is painted with its source's color multiplied by a
//! scalar intensity. The intensity comes from a user expression over two
//! variables: `len`, the cell's trajectory length, and `max_len`, the
//! longest trajectory seen so far.

use crate::error::SimError;
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};
use serde::Deserialize;

/// Name of the variable bound to the cell's trajectory length.
pub const LEN_VAR: &str = "len";
/// Name of the variable bound to the running maximum trajectory length.
pub const MAX_LEN_VAR: &str = "max_len";

/// An 8-bit RGB triple. Deserializes from `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiplies each channel by `scale`, saturating to `0..=255`.
    ///
    /// A NaN scale yields black.
    pub fn scaled(self, scale: f64) -> Rgb {
        let channel = |c: u8| (c as f64 * scale).clamp(0.0, 255.0) as u8;
        Rgb {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
        }
    }

    /// Channels as an array, in `[r, g, b]` order.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb { r, g, b }
    }
}

/// A parsed color scheme expression.
///
/// Parsing happens once at load; [`ColorScheme::scale`] then binds `len` and
/// `max_len` in a fresh context, so one scheme can be shared by all threads.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    expression: String,
    tree: Node,
}

impl ColorScheme {
    /// Parses `expression` and test-evaluates it once with `len = max_len = 1`.
    ///
    /// Returns `SimError::Config` for an empty expression and
    /// `SimError::Evaluator` if it does not parse or references unknown
    /// variables.
    pub fn new(expression: &str) -> Result<Self, SimError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(SimError::Config(
                "no expression for color scheme given".into(),
            ));
        }
        let tree = build_operator_tree(expression).map_err(|e| SimError::Evaluator {
            expression: expression.to_owned(),
            message: e.to_string(),
        })?;
        let scheme = Self {
            expression: expression.to_owned(),
            tree,
        };
        scheme.scale(1.0, 1.0)?;
        Ok(scheme)
    }

    /// The expression text as configured (trimmed).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluates the intensity for a cell of length `len`.
    pub fn scale(&self, len: f64, max_len: f64) -> Result<f64, SimError> {
        let mut context = HashMapContext::new();
        context
            .set_value(LEN_VAR.into(), Value::Float(len))
            .map_err(|e| self.evaluator_error(e))?;
        context
            .set_value(MAX_LEN_VAR.into(), Value::Float(max_len))
            .map_err(|e| self.evaluator_error(e))?;
        self.tree
            .eval_number_with_context(&context)
            .map_err(|e| self.evaluator_error(e))
    }

    /// Colors a cell: `color` scaled by the evaluated intensity.
    pub fn shade(&self, color: Rgb, len: f64, max_len: f64) -> Result<Rgb, SimError> {
        Ok(color.scaled(self.scale(len, max_len)?))
    }

    fn evaluator_error(&self, err: evalexpr::EvalexprError) -> SimError {
        SimError::Evaluator {
            expression: self.expression.clone(),
            message: err.to_string(),
        }
    }
}
