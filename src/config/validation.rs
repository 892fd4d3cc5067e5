//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{AxisConfig, ControllerConfig};

/// Validate a controller configuration.
///
/// Checks:
/// - Gear ratios, screw pitch and lever radius are positive
/// - The step interval leaves room for the pulse width
/// - Homing bounds are non-zero
pub fn validate_config(config: &ControllerConfig) -> Result<()> {
    validate_axis(&config.azimuth)?;
    validate_axis(&config.altitude)?;

    let timing = &config.timing;
    if timing.step_interval_us == 0 || timing.step_interval_us <= timing.pulse_width_us {
        return Err(Error::Config(ConfigError::InvalidStepInterval(
            timing.step_interval_us,
        )));
    }

    let homing = &config.homing;
    if homing.max_travel.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidHomingTravel(
            homing.max_travel.0,
        )));
    }
    if homing.pull_off_max_steps == 0 {
        return Err(Error::Config(ConfigError::InvalidPullOff));
    }

    Ok(())
}

fn validate_axis(config: &AxisConfig) -> Result<()> {
    if config.gear_ratio <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidGearRatio(config.gear_ratio)));
    }

    if let Some(screw) = config.screw {
        if screw.pitch_mm <= 0.0 || screw.lever_radius_mm <= 0.0 {
            return Err(Error::Config(ConfigError::InvalidScrewGeometry {
                pitch_mm: screw.pitch_mm,
                lever_radius_mm: screw.lever_radius_mm,
            }));
        }
    }

    Ok(())
}
