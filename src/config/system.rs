//! Controller configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxisConfig;
use super::units::Degrees;

/// Step pulse timing shared by both axes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Minimum time between two step pulses in microseconds (sets the
    /// constant step rate).
    #[serde(default = "default_step_interval_us")]
    pub step_interval_us: u32,

    /// STEP high time in microseconds.
    #[serde(default = "default_pulse_width_us")]
    pub pulse_width_us: u32,

    /// Settling time after a DIR change before the first pulse.
    #[serde(default = "default_direction_setup_us")]
    pub direction_setup_us: u32,
}

fn default_step_interval_us() -> u32 {
    500
}

fn default_pulse_width_us() -> u32 {
    2
}

fn default_direction_setup_us() -> u32 {
    5
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_interval_us: default_step_interval_us(),
            pulse_width_us: default_pulse_width_us(),
            direction_setup_us: default_direction_setup_us(),
        }
    }
}

/// Altitude homing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HomingConfig {
    /// Delay between pulses while homing, in microseconds.
    #[serde(default = "default_search_interval_us")]
    pub step_interval_us: u32,

    /// Maximum travel toward the sensor before giving up.
    #[serde(default = "default_max_travel", rename = "max_travel_deg")]
    pub max_travel: Degrees,

    /// Extra travel away from the sensor when homing starts on a triggered sensor.
    #[serde(default = "default_clearance", rename = "clearance_deg")]
    pub clearance: Degrees,

    /// Upper bound on pull-off steps while waiting for the sensor to release.
    #[serde(default = "default_pull_off_max_steps")]
    pub pull_off_max_steps: u32,

    /// Steps taken past the release point.
    #[serde(default = "default_pull_off_margin_steps")]
    pub pull_off_margin_steps: u32,
}

fn default_search_interval_us() -> u32 {
    1_000
}

fn default_max_travel() -> Degrees {
    Degrees(30.0)
}

fn default_clearance() -> Degrees {
    Degrees(2.0)
}

fn default_pull_off_max_steps() -> u32 {
    20_000
}

fn default_pull_off_margin_steps() -> u32 {
    200
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            step_interval_us: default_search_interval_us(),
            max_travel: default_max_travel(),
            clearance: default_clearance(),
            pull_off_max_steps: default_pull_off_max_steps(),
            pull_off_margin_steps: default_pull_off_margin_steps(),
        }
    }
}

/// Input polarity of the limit sensor and the home button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InputConfig {
    /// Limit sensor reads low when triggered (open-collector with pull-up).
    #[serde(default = "default_true")]
    pub limit_active_low: bool,

    /// Home button reads low when pressed.
    #[serde(default = "default_true")]
    pub button_active_low: bool,
}

fn default_true() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            limit_active_low: true,
            button_active_low: true,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ControllerConfig {
    /// Azimuth axis drive (`X` on the wire).
    #[serde(default = "AxisConfig::azimuth_default")]
    pub azimuth: AxisConfig,

    /// Altitude axis drive (`Y` on the wire).
    #[serde(default = "AxisConfig::altitude_default")]
    pub altitude: AxisConfig,

    /// Step pulse timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Homing parameters.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Sensor and button polarity.
    #[serde(default)]
    pub inputs: InputConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            azimuth: AxisConfig::azimuth_default(),
            altitude: AxisConfig::altitude_default(),
            timing: TimingConfig::default(),
            homing: HomingConfig::default(),
            inputs: InputConfig::default(),
        }
    }
}
