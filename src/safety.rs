//! Safety monitor.
//!
//! Reads the Altitude limit sensor and the abort flag after every pulse.
//! The sensor sits at the low end of Altitude travel, so only moves that
//! decrease Altitude can run into it.

use embedded_hal::digital::InputPin;

use crate::error::{MotorError, Result};
use crate::motion::{Axis, ControlFlags};
use crate::motor::Direction;

/// Outcome of a post-pulse safety check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// Keep stepping.
    Ok,
    /// Limit sensor reached while moving toward it.
    LimitTripped,
    /// Abort requested by the host.
    AbortRequested,
}

/// Limit sensor wrapper with configurable polarity.
pub struct SafetyMonitor<LIMIT: InputPin> {
    limit: LIMIT,
    active_low: bool,
    trips: u32,
}

impl<LIMIT: InputPin> SafetyMonitor<LIMIT> {
    /// Wrap the sensor input. `active_low` sensors read low when triggered.
    pub fn new(limit: LIMIT, active_low: bool) -> Self {
        Self {
            limit,
            active_low,
            trips: 0,
        }
    }

    /// Whether the sensor currently reads triggered.
    pub fn limit_triggered(&mut self) -> Result<bool> {
        let high = self.limit.is_high().map_err(|_| MotorError::InputError)?;
        Ok(high != self.active_low)
    }

    /// Check run after each pulse of the active move.
    ///
    /// The limit is consulted only for Altitude moves heading toward the
    /// sensor; a limit trip outranks a pending abort.
    pub fn check_after_step(
        &mut self,
        axis: Axis,
        direction: Direction,
        flags: &ControlFlags,
    ) -> Result<SafetyStatus> {
        if axis == Axis::Altitude && direction == Direction::Negative && self.limit_triggered()? {
            self.trips = self.trips.saturating_add(1);
            return Ok(SafetyStatus::LimitTripped);
        }

        if flags.abort_requested {
            return Ok(SafetyStatus::AbortRequested);
        }

        Ok(SafetyStatus::Ok)
    }

    /// Limit trips seen since startup.
    pub fn trip_count(&self) -> u32 {
        self.trips
    }

    /// Give the sensor pin back.
    pub fn release(self) -> LIMIT {
        self.limit
    }
}
