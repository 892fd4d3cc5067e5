//! Motor output module for polar-motion.
//!
//! STEP/DIR output stages plus the clock and driver-control seams.

mod control;
mod driver;

pub use control::{Clock, DriverControl, NoDriverControl, SharedEnablePin};
pub use driver::{Direction, StepperAxis};
