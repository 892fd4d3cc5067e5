//! Timing and driver-control seams.
//!
//! The engine needs a free-running microsecond clock for its rate gate and a
//! way to tell the attached driver layer (enable lines, smart-driver shadow
//! registers) about enable state and direction changes.

use embedded_hal::digital::OutputPin;

use crate::error::{MotorError, Result};
use crate::motion::Axis;

use super::driver::Direction;

/// Monotonic microsecond time source.
///
/// Usually implemented by the same hardware timer that provides `DelayNs`.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;
}

/// Driver control capability consumed by the motion engine.
pub trait DriverControl {
    /// Energise or release the driver of `axis`.
    fn set_enabled(&mut self, axis: Axis, enabled: bool) -> Result<()>;

    /// Mirror a DIR change into any direction state the driver layer keeps.
    fn sync_direction(&mut self, axis: Axis, direction: Direction) -> Result<()>;
}

/// Driver layer with nothing to configure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDriverControl;

impl DriverControl for NoDriverControl {
    fn set_enabled(&mut self, _axis: Axis, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn sync_direction(&mut self, _axis: Axis, _direction: Direction) -> Result<()> {
        Ok(())
    }
}

/// One active-low EN line shared by both drivers.
///
/// The line is released only when both axes are disabled.
pub struct SharedEnablePin<EN: OutputPin> {
    pin: EN,
    enabled: [bool; 2],
}

impl<EN: OutputPin> SharedEnablePin<EN> {
    /// Wrap the EN pin. Drivers start disabled.
    pub fn new(pin: EN) -> Self {
        Self {
            pin,
            enabled: [false; 2],
        }
    }

    /// Give the pin back.
    pub fn release(self) -> EN {
        self.pin
    }
}

impl<EN: OutputPin> DriverControl for SharedEnablePin<EN> {
    fn set_enabled(&mut self, axis: Axis, enabled: bool) -> Result<()> {
        self.enabled[axis.index()] = enabled;
        if self.enabled.iter().any(|&e| e) {
            self.pin.set_low().map_err(|_| MotorError::PinError)?;
        } else {
            self.pin.set_high().map_err(|_| MotorError::PinError)?;
        }
        Ok(())
    }

    fn sync_direction(&mut self, _axis: Axis, _direction: Direction) -> Result<()> {
        Ok(())
    }
}
