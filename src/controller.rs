//! Control loop.
//!
//! [`Controller`] owns every piece of runtime state and is driven by calling
//! [`Controller::poll`] in a tight loop. Each call reads whatever the host
//! sent, then handles pending realtime commands, a pending abort, one engine
//! tick, the homing button and at most one line command, in that order.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{ControllerConfig, Degrees};
use crate::error::{Error, HomingError, MotorError, Result};
use crate::motion::{Axis, ControlFlags, EngineStatus, MotionEngine, TickEvent};
use crate::motor::{Clock, DriverControl};
use crate::protocol::reply::{self, Alarm};
use crate::protocol::{ByteSource, Command, JogRequest, PositionMode, ProtocolHandler, Realtime};
use crate::safety::SafetyMonitor;

/// Momentary push-button with edge detection.
pub struct HomeButton<BUTTON: InputPin> {
    pin: BUTTON,
    active_low: bool,
    was_pressed: bool,
}

impl<BUTTON: InputPin> HomeButton<BUTTON> {
    /// Wrap the button input. `active_low` buttons read low when pressed.
    pub fn new(pin: BUTTON, active_low: bool) -> Self {
        Self {
            pin,
            active_low,
            was_pressed: false,
        }
    }

    /// Whether the button reads pressed right now.
    pub fn is_pressed(&mut self) -> Result<bool> {
        let high = self.pin.is_high().map_err(|_| MotorError::InputError)?;
        Ok(high != self.active_low)
    }

    /// `true` once per press, on the released-to-pressed edge.
    pub fn poll_pressed(&mut self) -> Result<bool> {
        let pressed = self.is_pressed()?;
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        Ok(edge)
    }

    /// Give the pin back.
    pub fn release(self) -> BUTTON {
        self.pin
    }
}

/// The whole controller.
pub struct Controller<STEP, DIR, TIMER, LIMIT, BUTTON, DRV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    TIMER: DelayNs + Clock,
    LIMIT: InputPin,
    BUTTON: InputPin,
    DRV: DriverControl,
{
    engine: MotionEngine<STEP, DIR, TIMER, DRV>,
    safety: SafetyMonitor<LIMIT>,
    button: HomeButton<BUTTON>,
    protocol: ProtocolHandler,
    flags: ControlFlags,
}

impl<STEP, DIR, TIMER, LIMIT, BUTTON, DRV> Controller<STEP, DIR, TIMER, LIMIT, BUTTON, DRV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    TIMER: DelayNs + Clock,
    LIMIT: InputPin,
    BUTTON: InputPin,
    DRV: DriverControl,
{
    /// Assemble a controller from its hardware.
    pub fn new(
        config: &ControllerConfig,
        azimuth: (STEP, DIR),
        altitude: (STEP, DIR),
        timer: TIMER,
        driver: DRV,
        limit: LIMIT,
        button: BUTTON,
    ) -> Self {
        Self {
            engine: MotionEngine::new(config, azimuth, altitude, timer, driver),
            safety: SafetyMonitor::new(limit, config.inputs.limit_active_low),
            button: HomeButton::new(button, config.inputs.button_active_low),
            protocol: ProtocolHandler::new(),
            flags: ControlFlags::default(),
        }
    }

    /// Energise the drivers. No banner is sent.
    pub fn enable(&mut self) -> Result<()> {
        self.engine.enable()?;
        info!("controller ready");
        Ok(())
    }

    /// Feed bytes received from the host, e.g. by a receive interrupt.
    pub fn receive(&mut self, bytes: &[u8]) {
        self.protocol.receive(bytes);
    }

    /// Run one control loop iteration.
    ///
    /// Bytes waiting in `input` are taken first. Replies go to `out`. While
    /// homing blocks, `input` keeps being read between pulses.
    pub fn poll<S, W>(&mut self, input: &mut S, out: &mut W) -> Result<()>
    where
        S: ByteSource + ?Sized,
        W: Write,
    {
        self.protocol.pump(input);
        while let Some(command) = self.protocol.poll_realtime() {
            self.realtime(command, out)?;
        }

        if self.flags.abort_requested {
            self.abort();
        }

        match self.engine.tick(&self.flags, &mut self.safety)? {
            TickEvent::LimitTripped(pull_off) => {
                if !pull_off.released {
                    warn!("limit sensor still triggered after pull-off");
                }
                reply::write_alarm(out, Alarm::HardLimit)?;
            }
            TickEvent::Aborted => self.flags.reset(),
            _ => {}
        }

        if self.button.poll_pressed()? {
            info!("home button pressed");
            self.home(input, out)?;
        }

        if let Some(command) = self.protocol.next_command() {
            self.execute(command, input, out)?;
        }

        Ok(())
    }

    fn realtime<W: Write>(&mut self, command: Realtime, out: &mut W) -> Result<()> {
        match command {
            Realtime::StatusQuery => self.write_status(out)?,
            Realtime::FeedHold => {
                self.flags.feed_hold = true;
                reply::write_ok(out)?;
            }
            Realtime::CycleStart => {
                self.flags.feed_hold = false;
                reply::write_ok(out)?;
            }
            Realtime::Abort => self.flags.abort_requested = true,
        }
        Ok(())
    }

    /// Drop all motion and clear both flags. Positions are kept.
    pub fn soft_reset(&mut self) {
        self.engine.stop();
        self.flags.reset();
        warn!("soft reset");
    }

    /// Soft reset on Ctrl-X. Lines received before the abort are discarded
    /// along with the motion.
    fn abort(&mut self) {
        self.soft_reset();
        self.protocol.clear_lines();
    }

    /// Run one parsed line command. `input` is only read by `HOME`.
    pub fn execute<S, W>(&mut self, command: Command, input: &mut S, out: &mut W) -> Result<()>
    where
        S: ByteSource + ?Sized,
        W: Write,
    {
        match command {
            Command::Reset => {
                self.soft_reset();
                reply::write_banner(out)?;
            }
            Command::Home => self.home(input, out)?,
            Command::Jog(jog) => {
                self.queue_jog(&jog);
                reply::write_ok(out)?;
                self.engine.start()?;
            }
            Command::LegacyAltitude(delta) => {
                self.engine.preempt();
                let job = self.engine.job(Axis::Altitude, Degrees(delta));
                self.engine.enqueue(job);
                reply::write_legacy_ok(out)?;
                self.write_status(out)?;
                self.engine.start()?;
            }
        }
        Ok(())
    }

    /// Replace any motion in flight with the jog's moves.
    ///
    /// The active move is finished at its target so absolute targets resolve
    /// against where the previous jog was headed.
    fn queue_jog(&mut self, jog: &JogRequest) {
        self.engine.preempt();
        for &(axis, value) in &jog.targets {
            let delta = match jog.mode {
                PositionMode::Relative => value,
                PositionMode::Absolute => value - self.engine.position(axis).0,
            };
            let job = self.engine.job(axis, Degrees(delta));
            self.engine.enqueue(job);
        }
    }

    /// Home the Altitude axis.
    ///
    /// Blocks until the sensor is found, the travel bound runs out or the
    /// host aborts. `input` is read between pulses and realtime bytes are
    /// serviced there: `?` reports the positions held when homing started.
    /// Lines arriving meanwhile wait until homing ends.
    pub fn home<S, W>(&mut self, input: &mut S, out: &mut W) -> Result<()>
    where
        S: ByteSource + ?Sized,
        W: Write,
    {
        self.engine.stop();
        let azimuth = self.engine.position(Axis::Azimuth);
        let altitude = self.engine.position(Axis::Altitude);
        info!("homing from altitude {}", altitude.0);

        let Self {
            engine,
            safety,
            protocol,
            flags,
            ..
        } = self;
        let mut sink_failed = false;
        let result = engine.homing_drive(safety).run(|| {
            protocol.pump(&mut *input);
            while let Some(command) = protocol.poll_realtime() {
                let written = match command {
                    Realtime::Abort => {
                        flags.abort_requested = true;
                        Ok(())
                    }
                    Realtime::StatusQuery => {
                        reply::write_status(&mut *out, EngineStatus::Run, azimuth, altitude)
                    }
                    // Homing ignores hold; the flag applies to the next move.
                    Realtime::FeedHold => {
                        flags.feed_hold = true;
                        reply::write_ok(&mut *out)
                    }
                    Realtime::CycleStart => {
                        flags.feed_hold = false;
                        reply::write_ok(&mut *out)
                    }
                };
                sink_failed |= written.is_err();
            }
            flags.abort_requested
        });
        if sink_failed {
            return Err(Error::Output);
        }

        match result {
            Ok(_) => {
                self.engine.set_position(Axis::Altitude, Degrees(0.0));
                reply::write_message(out, "Homing complete")?;
                self.write_status(out)?;
                Ok(())
            }
            Err(Error::Homing(HomingError::SensorNotFound | HomingError::SensorStuck)) => {
                reply::write_alarm(out, Alarm::HomingFailed)?;
                Ok(())
            }
            Err(Error::Homing(HomingError::Aborted)) => {
                self.abort();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Machine state as reported in status frames.
    pub fn status(&self) -> EngineStatus {
        EngineStatus::derive(&self.flags, self.engine.is_moving())
    }

    /// Write a status frame for the current state.
    pub fn write_status<W: Write>(&self, out: &mut W) -> Result<()> {
        reply::write_status(
            out,
            self.status(),
            self.engine.position(Axis::Azimuth),
            self.engine.position(Axis::Altitude),
        )?;
        Ok(())
    }

    /// Current position of `axis`.
    pub fn position(&self, axis: Axis) -> Degrees {
        self.engine.position(axis)
    }

    /// Realtime flags.
    pub fn flags(&self) -> &ControlFlags {
        &self.flags
    }

    /// The motion engine.
    pub fn engine(&self) -> &MotionEngine<STEP, DIR, TIMER, DRV> {
        &self.engine
    }

    /// The motion engine, mutably.
    pub fn engine_mut(&mut self) -> &mut MotionEngine<STEP, DIR, TIMER, DRV> {
        &mut self.engine
    }

    /// The limit sensor monitor.
    pub fn safety(&self) -> &SafetyMonitor<LIMIT> {
        &self.safety
    }

    /// Receive-side buffers.
    pub fn protocol(&self) -> &ProtocolHandler {
        &self.protocol
    }
}
