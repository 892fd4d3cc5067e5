//! Configuration module for polar-motion.
//!
//! Axis geometry, pulse timing and homing parameters. Every field has a
//! built-in default matching the reference mount, so a controller can be
//! brought up without any file; with the `std` feature the same structure
//! can be loaded from TOML.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod system;
pub mod units;
mod validation;

pub use axis::{AxisConfig, ScrewDrive};
pub use system::{ControllerConfig, HomingConfig, InputConfig, TimingConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

pub use units::{Degrees, Microsteps, Steps};
