//! Per-axis drive geometry from configuration.

use core::f32::consts::PI;

use serde::Deserialize;

use super::units::Microsteps;

/// Lead screw acting on a lever arm, converting screw travel into rotation.
///
/// Used by the Altitude axis, where the motor turns a screw that pushes a
/// lever of `lever_radius_mm` around its pivot.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrewDrive {
    /// Linear travel per screw revolution in millimetres.
    pub pitch_mm: f32,

    /// Distance from pivot to the screw contact point in millimetres.
    pub lever_radius_mm: f32,
}

impl ScrewDrive {
    /// Screw revolutions needed to rotate the lever by one degree.
    pub fn revolutions_per_degree(&self) -> f32 {
        self.lever_radius_mm * PI / 180.0 / self.pitch_mm
    }
}

/// Complete axis drive configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Base steps per motor revolution (200 for 1.8° motors).
    #[serde(default = "default_full_steps")]
    pub full_steps_per_revolution: u16,

    /// Microstep setting of the driver.
    #[serde(default)]
    pub microsteps: Microsteps,

    /// Gearbox reduction (motor turns per output turn).
    #[serde(default = "default_gear_ratio")]
    pub gear_ratio: f32,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Optional screw/lever stage after the gearbox.
    #[serde(default)]
    pub screw: Option<ScrewDrive>,
}

fn default_full_steps() -> u16 {
    200
}

fn default_gear_ratio() -> f32 {
    1.0
}

impl AxisConfig {
    /// Azimuth drive: 200-step motor, 1/16 microstepping, 100:1 worm reduction.
    pub const fn azimuth_default() -> Self {
        Self {
            full_steps_per_revolution: 200,
            microsteps: Microsteps::SIXTEENTH,
            gear_ratio: 100.0,
            invert_direction: false,
            screw: None,
        }
    }

    /// Altitude drive: 200-step motor, 1/16 microstepping, direct drive on a
    /// 2 mm lead screw pushing a 100 mm lever.
    pub const fn altitude_default() -> Self {
        Self {
            full_steps_per_revolution: 200,
            microsteps: Microsteps::SIXTEENTH,
            gear_ratio: 1.0,
            invert_direction: true,
            screw: Some(ScrewDrive {
                pitch_mm: 2.0,
                lever_radius_mm: 100.0,
            }),
        }
    }

    /// Motor steps per motor-shaft revolution after the gearbox.
    pub fn steps_per_output_revolution(&self) -> f32 {
        self.full_steps_per_revolution as f32 * self.microsteps.value() as f32 * self.gear_ratio
    }

    /// Steps per degree of axis rotation.
    pub fn steps_per_degree(&self) -> f32 {
        match self.screw {
            Some(screw) => self.steps_per_output_revolution() * screw.revolutions_per_degree(),
            None => self.steps_per_output_revolution() / 360.0,
        }
    }
}
