//! # polar-motion
//!
//! Two-axis (Azimuth/Altitude) stepper controller speaking a GRBL-flavoured
//! serial protocol, built on embedded-hal 1.0.
//!
//! ## Features
//!
//! - **Tick-driven motion**: at most one STEP pulse per control loop
//!   iteration, so realtime commands are never starved
//! - **Realtime commands**: `?` status, `!` feed hold, `~` resume, Ctrl-X abort
//! - **Jogging**: `$J=` with `G90`/`G91`, plus the legacy `ALT:` command
//! - **Homing**: bounded Altitude search against a limit sensor, with pull-off
//! - **Limit protection**: Altitude moves toward the sensor stop and re-zero
//! - **no_std compatible**: fixed-capacity buffers from `heapless`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polar_motion::{Controller, ControllerConfig, NoDriverControl};
//!
//! let config = ControllerConfig::default();
//! let mut controller = Controller::new(
//!     &config,
//!     (az_step, az_dir),
//!     (alt_step, alt_dir),
//!     timer,
//!     NoDriverControl,
//!     limit_pin,
//!     button_pin,
//! );
//! controller.enable()?;
//!
//! loop {
//!     // Any `FnMut() -> Option<u8>` works as the byte source.
//!     controller.poll(&mut || rx.read().ok(), &mut tx)?;
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables TOML configuration loading
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[macro_use]
mod log;

// Core modules
pub mod config;
pub mod controller;
pub mod error;
pub mod homing;
pub mod motion;
pub mod motor;
pub mod protocol;
pub mod safety;

// Re-exports for ergonomic API
pub use config::{validate_config, AxisConfig, ControllerConfig, HomingConfig, TimingConfig};
pub use controller::{Controller, HomeButton};
pub use error::{Error, Result};
pub use motion::{Axis, ControlFlags, EngineStatus, MotionEngine, TickEvent};
pub use motor::{Clock, Direction, DriverControl, NoDriverControl, StepperAxis};
pub use protocol::{ByteSource, Command, ProtocolHandler, Realtime};
pub use safety::SafetyMonitor;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Degrees, Microsteps, Steps};
