//! Field sources acting on the pendulum bob.
//!
//! A [`ForceSource`] is a fixed point in the source plane with a strength,
//! a capture radius, a display color, and one of four force laws. The
//! pendulum swings in a plane a fixed height above the sources, so the
//! distance used by the laws is the 3D distance including that height while
//! the force itself acts along the planar offset `r`.

use crate::color::Rgb;
use crate::error::SimError;
use glam::DVec2;

/// Distance dependence of a source's force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceLaw {
    /// Spring-like restoring force, `F = k r`.
    Linear,
    /// `F = k r / d²`.
    Inverse,
    /// Coulomb-like, `F = k r / d³`.
    InverseSquare,
    /// `F = k r / d⁴`.
    InverseQuartic,
}

/// Registry of recognised law names, in declaration order.
const FORCE_LAWS: &[(&str, ForceLaw)] = &[
    ("LINEAR", ForceLaw::Linear),
    ("INV", ForceLaw::Inverse),
    ("INV_SQR", ForceLaw::InverseSquare),
    ("INV_QRT", ForceLaw::InverseQuartic),
];

impl ForceLaw {
    /// Looks up a law by its configuration name (case-insensitive).
    ///
    /// Returns `SimError::UnknownForceLaw` if the name is not registered.
    pub fn from_name(name: &str) -> Result<Self, SimError> {
        let wanted = name.trim();
        FORCE_LAWS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(wanted))
            .map(|&(_, law)| law)
            .ok_or_else(|| SimError::UnknownForceLaw(wanted.to_owned()))
    }

    /// Configuration name of this law.
    pub fn name(self) -> &'static str {
        FORCE_LAWS
            .iter()
            .find(|&&(_, law)| law == self)
            .map(|&(n, _)| n)
            .unwrap_or("LINEAR")
    }

    /// All registered law names.
    pub fn list_names() -> impl Iterator<Item = &'static str> {
        FORCE_LAWS.iter().map(|&(n, _)| n)
    }

    /// Force exerted on the bob at planar offset `r` and 3D distance `dist`.
    #[inline]
    pub fn force(self, strength: f64, r: DVec2, dist: f64) -> DVec2 {
        match self {
            ForceLaw::Linear => strength * r,
            ForceLaw::Inverse => (strength / (dist * dist)) * r,
            ForceLaw::InverseSquare => (strength / (dist * dist * dist)) * r,
            ForceLaw::InverseQuartic => (strength / (dist * dist * dist * dist)) * r,
        }
    }

    /// Potential energy at 3D distance `dist`.
    pub fn potential(self, strength: f64, dist: f64) -> f64 {
        match self {
            ForceLaw::Linear => 0.5 * strength * dist * dist,
            ForceLaw::Inverse => strength * dist.ln(),
            ForceLaw::InverseSquare | ForceLaw::InverseQuartic => strength / dist,
        }
    }
}

/// An immutable field source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSource {
    position: DVec2,
    size: f64,
    strength: f64,
    color: Rgb,
    law: ForceLaw,
}

impl ForceSource {
    pub fn new(position: DVec2, size: f64, strength: f64, color: Rgb, law: ForceLaw) -> Self {
        Self {
            position,
            size,
            strength,
            color,
            law,
        }
    }

    /// Builds a source whose law is given by registry name.
    pub fn with_law_name(
        law: &str,
        position: DVec2,
        size: f64,
        strength: f64,
        color: Rgb,
    ) -> Result<Self, SimError> {
        Ok(Self::new(
            position,
            size,
            strength,
            color,
            ForceLaw::from_name(law)?,
        ))
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Capture radius used by the termination test and for drawing.
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn law(&self) -> ForceLaw {
        self.law
    }

    /// 3D distance from the bob at `pos` swinging `height` above this source's plane.
    #[inline]
    pub fn distance(&self, pos: DVec2, height: f64) -> f64 {
        ((self.position - pos).length_squared() + height * height).sqrt()
    }

    /// Force for planar offset `r = bob - source` and 3D distance `dist`.
    #[inline]
    pub fn query_force(&self, r: DVec2, dist: f64) -> DVec2 {
        self.law.force(self.strength, r, dist)
    }

    /// Potential energy at 3D distance `dist`.
    pub fn potential(&self, dist: f64) -> f64 {
        self.law.potential(self.strength, dist)
    }
}
