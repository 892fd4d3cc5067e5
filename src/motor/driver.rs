//! STEP/DIR output stage for one axis.
//!
//! Generic over embedded-hal 1.0 pin types. Knows nothing about positions or
//! jobs: it sets the direction line and emits single pulses on request.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{MotorError, Result};

/// Logical direction of travel in axis coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Position increases with each step.
    Positive,
    /// Position decreases with each step.
    Negative,
}

impl Direction {
    /// Get direction from a signed displacement.
    #[inline]
    pub fn from_delta(delta: f32) -> Self {
        if delta >= 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the opposite direction.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// STEP and DIR pins of a single axis.
pub struct StepperAxis<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (high = positive, unless inverted).
    dir_pin: DIR,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,
}

impl<STEP, DIR> StepperAxis<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Wrap a pair of output pins.
    pub fn new(step_pin: STEP, dir_pin: DIR, invert_direction: bool) -> Self {
        Self {
            step_pin,
            dir_pin,
            invert_direction,
            current_direction: None,
        }
    }

    /// Last direction written to the DIR pin.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.current_direction
    }

    /// Whether DIR logic is inverted for this axis.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.invert_direction
    }

    /// Drive the DIR pin for `direction`.
    ///
    /// Returns `true` when the pin level actually changed.
    pub fn set_direction(&mut self, direction: Direction) -> Result<bool> {
        if self.current_direction == Some(direction) {
            return Ok(false);
        }

        let pin_high = match direction {
            Direction::Positive => !self.invert_direction,
            Direction::Negative => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.current_direction = Some(direction);
        Ok(true)
    }

    /// Emit one STEP pulse of `width_us` high time.
    pub fn pulse<D: DelayNs>(&mut self, delay: &mut D, width_us: u32) -> Result<()> {
        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        delay.delay_us(width_us);
        self.step_pin.set_low().map_err(|_| MotorError::PinError)?;
        Ok(())
    }

    /// Give the pins back.
    pub fn release(self) -> (STEP, DIR) {
        (self.step_pin, self.dir_pin)
    }
}
