//! Altitude homing and limit pull-off.
//!
//! Both run blocking and drive the Altitude STEP/DIR outputs directly,
//! outside the tick-driven engine. Every loop is bounded by a step count and
//! the homing search polls an injected cancellation check between pulses.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use libm::{ceilf, fabsf};

use crate::config::{HomingConfig, TimingConfig};
use crate::error::{HomingError, Result};
use crate::motion::Axis;
use crate::motor::{Direction, DriverControl, StepperAxis};
use crate::safety::SafetyMonitor;

/// Direction in which the limit sensor lies.
pub const TOWARD_SENSOR: Direction = Direction::Negative;

/// Result of a pull-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PullOff {
    /// Sensor released before the step bound ran out.
    pub released: bool,
    /// Steps taken, margin included.
    pub steps: u32,
}

/// Exclusive handle on the Altitude outputs for blocking moves.
pub struct HomingDrive<'a, STEP, DIR, D, DRV, LIMIT>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
    DRV: DriverControl,
    LIMIT: InputPin,
{
    axis: &'a mut StepperAxis<STEP, DIR>,
    driver: &'a mut DRV,
    delay: &'a mut D,
    safety: &'a mut SafetyMonitor<LIMIT>,
    homing: HomingConfig,
    timing: TimingConfig,
    steps_per_degree: f32,
}

impl<'a, STEP, DIR, D, DRV, LIMIT> HomingDrive<'a, STEP, DIR, D, DRV, LIMIT>
where
    STEP: OutputPin,
    DIR: OutputPin,
    D: DelayNs,
    DRV: DriverControl,
    LIMIT: InputPin,
{
    /// Borrow the Altitude outputs and the sensor.
    pub fn new(
        axis: &'a mut StepperAxis<STEP, DIR>,
        driver: &'a mut DRV,
        delay: &'a mut D,
        safety: &'a mut SafetyMonitor<LIMIT>,
        homing: HomingConfig,
        timing: TimingConfig,
        steps_per_degree: f32,
    ) -> Self {
        Self {
            axis,
            driver,
            delay,
            safety,
            homing,
            timing,
            steps_per_degree,
        }
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.axis.set_direction(direction)? {
            self.driver.sync_direction(Axis::Altitude, direction)?;
            self.delay.delay_us(self.timing.direction_setup_us);
        }
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.axis.pulse(&mut *self.delay, self.timing.pulse_width_us)?;
        self.delay.delay_us(self.homing.step_interval_us);
        Ok(())
    }

    fn steps_for(&self, degrees: f32) -> u32 {
        ceilf(fabsf(degrees) * self.steps_per_degree) as u32
    }

    /// Step away from the sensor until it releases, then add the margin.
    pub fn pull_off(&mut self) -> Result<PullOff> {
        self.set_direction(TOWARD_SENSOR.opposite())?;

        let mut steps = 0;
        let mut released = false;
        while steps < self.homing.pull_off_max_steps {
            if !self.safety.limit_triggered()? {
                released = true;
                break;
            }
            self.step()?;
            steps += 1;
        }

        if !released {
            warn!("pull-off: sensor still triggered after {} steps", steps);
        }

        for _ in 0..self.homing.pull_off_margin_steps {
            self.step()?;
        }
        steps += self.homing.pull_off_margin_steps;

        debug!("pull-off complete after {} steps", steps);
        Ok(PullOff { released, steps })
    }

    /// Run the homing sequence.
    ///
    /// `cancel` is polled between pulses of the clearance and search phases;
    /// returning `true` ends homing with [`HomingError::Aborted`]. On success
    /// the axis sits just clear of the sensor and the caller zeroes its
    /// position. A sensor that never triggers yields
    /// [`HomingError::SensorNotFound`]; one that never releases on pull-off
    /// yields [`HomingError::SensorStuck`].
    pub fn run<F>(&mut self, mut cancel: F) -> Result<PullOff>
    where
        F: FnMut() -> bool,
    {
        if self.safety.limit_triggered()? {
            info!("homing: starting on the sensor, backing off");
            if !self.pull_off()?.released {
                return Err(HomingError::SensorStuck.into());
            }

            let clearance = self.steps_for(self.homing.clearance.0);
            for _ in 0..clearance {
                if cancel() {
                    return Err(HomingError::Aborted.into());
                }
                self.step()?;
            }
        }

        self.set_direction(TOWARD_SENSOR)?;
        let max_steps = self.steps_for(self.homing.max_travel.0);
        let mut found = false;
        for _ in 0..max_steps {
            if cancel() {
                return Err(HomingError::Aborted.into());
            }
            if self.safety.limit_triggered()? {
                found = true;
                break;
            }
            self.step()?;
        }

        if !found && !self.safety.limit_triggered()? {
            warn!("homing: sensor not found within {} steps", max_steps);
            return Err(HomingError::SensorNotFound.into());
        }

        let pull_off = self.pull_off()?;
        if !pull_off.released {
            return Err(HomingError::SensorStuck.into());
        }
        info!("homing: complete");
        Ok(pull_off)
    }
}
