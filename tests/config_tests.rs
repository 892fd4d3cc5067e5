//! Configuration loading and validation through the public API.

#![cfg(feature = "std")]

use polar_motion::config::{ControllerConfig, ScrewDrive};
use polar_motion::error::{ConfigError, Error};
use polar_motion::{load_config, parse_config, validate_config, Microsteps};

const MOUNT_CONFIG: &str = r#"
[azimuth]
full_steps_per_revolution = 400
microsteps = 32
gear_ratio = 60.0

[altitude]
full_steps_per_revolution = 200
microsteps = 16
invert_direction = true

[altitude.screw]
pitch_mm = 1.0
lever_radius_mm = 150.0

[timing]
step_interval_us = 800
pulse_width_us = 4
direction_setup_us = 10

[homing]
step_interval_us = 2000
max_travel_deg = 15.0
clearance_deg = 1.5
pull_off_max_steps = 5000
pull_off_margin_steps = 100

[inputs]
limit_active_low = false
button_active_low = true
"#;

#[test]
fn parse_full_mount_config() {
    let config = parse_config(MOUNT_CONFIG).expect("Should parse mount config");

    assert_eq!(config.azimuth.full_steps_per_revolution, 400);
    assert_eq!(config.azimuth.microsteps, Microsteps::THIRTY_SECOND);
    assert!((config.azimuth.steps_per_degree() - 400.0 * 32.0 * 60.0 / 360.0).abs() < 0.01);

    assert!(config.altitude.invert_direction);
    assert_eq!(
        config.altitude.screw,
        Some(ScrewDrive {
            pitch_mm: 1.0,
            lever_radius_mm: 150.0,
        })
    );

    assert_eq!(config.timing.step_interval_us, 800);
    assert_eq!(config.timing.pulse_width_us, 4);
    assert_eq!(config.timing.direction_setup_us, 10);

    assert_eq!(config.homing.step_interval_us, 2000);
    assert_eq!(config.homing.max_travel.0, 15.0);
    assert_eq!(config.homing.clearance.0, 1.5);
    assert_eq!(config.homing.pull_off_max_steps, 5000);
    assert_eq!(config.homing.pull_off_margin_steps, 100);

    assert!(!config.inputs.limit_active_low);
    assert!(config.inputs.button_active_low);
}

#[test]
fn default_mount_constants() {
    let config = ControllerConfig::default();
    assert!((config.azimuth.steps_per_degree() - 888.889).abs() < 0.01);
    assert!((config.altitude.steps_per_degree() - 2792.527).abs() < 0.01);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn load_config_from_file() {
    let path = std::env::temp_dir().join(format!("polar-motion-{}.toml", std::process::id()));
    std::fs::write(&path, MOUNT_CONFIG).unwrap();

    let config = load_config(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(config.unwrap().azimuth.gear_ratio, 60.0);
}

#[test]
fn load_missing_file_is_io_error() {
    let result = load_config("/nonexistent/polar-motion.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::IoError(_)))));
}

#[test]
fn step_interval_must_exceed_pulse_width() {
    let toml = r#"
[timing]
step_interval_us = 2
pulse_width_us = 2
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::InvalidStepInterval(2)))
    ));
}

#[test]
fn negative_homing_travel_rejected() {
    let toml = r#"
[homing]
max_travel_deg = -5.0
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::InvalidHomingTravel(_)))
    ));
}

#[test]
fn zero_lever_radius_rejected() {
    let toml = r#"
[altitude.screw]
pitch_mm = 2.0
lever_radius_mm = 0.0
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::InvalidScrewGeometry { .. }))
    ));
}

#[test]
fn zero_pull_off_bound_rejected() {
    let toml = r#"
[homing]
pull_off_max_steps = 0
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::InvalidPullOff))
    ));
}

#[test]
fn unknown_toml_type_is_parse_error() {
    let toml = r#"
[azimuth]
gear_ratio = "fast"
"#;
    assert!(matches!(
        parse_config(toml),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}
