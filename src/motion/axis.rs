//! Axis identifiers and per-axis position state.

use crate::config::{AxisConfig, Degrees, Steps};

/// One of the two controlled axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Horizontal rotation, `X` on the wire.
    Azimuth,
    /// Elevation, `Y` on the wire. Carries the limit sensor.
    Altitude,
}

impl Axis {
    /// Both axes in table order.
    pub const ALL: [Axis; 2] = [Axis::Azimuth, Axis::Altitude];

    /// Index into per-axis tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::Azimuth => 0,
            Axis::Altitude => 1,
        }
    }

    /// Map a jog word letter to an axis.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'X' => Some(Axis::Azimuth),
            'Y' => Some(Axis::Altitude),
            _ => None,
        }
    }
}

/// Position and conversion constants of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// Authoritative angular position, updated on every step.
    pub position: Degrees,

    /// Steps per degree derived from the drive geometry.
    pub steps_per_degree: f32,

    /// DIR logic inverted.
    pub direction_inverted: bool,
}

impl AxisState {
    /// Derive the state of an axis at position zero.
    pub fn from_config(config: &AxisConfig) -> Self {
        Self {
            position: Degrees(0.0),
            steps_per_degree: config.steps_per_degree(),
            direction_inverted: config.invert_direction,
        }
    }
}

/// Degree/step conversion for both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    steps_per_degree: [f32; 2],
}

impl UnitConverter {
    /// Compute the constants once from configuration.
    pub fn new(azimuth: &AxisConfig, altitude: &AxisConfig) -> Self {
        Self {
            steps_per_degree: [azimuth.steps_per_degree(), altitude.steps_per_degree()],
        }
    }

    /// Steps per degree of `axis`.
    #[inline]
    pub fn steps_per_degree(&self, axis: Axis) -> f32 {
        self.steps_per_degree[axis.index()]
    }

    /// `round(degrees * steps_per_degree)`. Check the result with
    /// [`Steps::is_zero`] before treating it as a move.
    #[inline]
    pub fn degrees_to_steps(&self, axis: Axis, degrees: Degrees) -> Steps {
        Steps::from_degrees(degrees, self.steps_per_degree(axis))
    }

    /// Inverse conversion, for diagnostics.
    #[inline]
    pub fn steps_to_degrees(&self, axis: Axis, steps: Steps) -> Degrees {
        steps.to_degrees(self.steps_per_degree(axis))
    }
}
