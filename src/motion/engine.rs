//! Tick-driven step generator.
//!
//! The engine never blocks for longer than one pulse: each call to
//! [`MotionEngine::tick`] emits at most one step and returns, so the control
//! loop keeps servicing the serial port during long moves. Step cadence comes
//! from a rate gate on the clock, not from a busy-wait.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{ControllerConfig, Degrees, HomingConfig, Steps, TimingConfig};
use crate::error::Result;
use crate::homing::{HomingDrive, PullOff};
use crate::motor::{Clock, Direction, DriverControl, NoDriverControl, StepperAxis};
use crate::safety::{SafetyMonitor, SafetyStatus};

use super::axis::{Axis, AxisState, UnitConverter};
use super::flags::ControlFlags;
use super::job::{JobQueue, MotionJob};

/// Runtime state of the job currently being stepped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveMove {
    /// Axis being moved.
    pub axis: Axis,
    /// Logical direction of travel.
    pub direction: Direction,
    /// Pulses still to emit.
    pub steps_remaining: u32,
    /// Signed position increment applied per pulse.
    pub degrees_per_step: f32,
    /// Exact final position, assigned on completion.
    pub target: Degrees,
    /// Clock reading at the previous pulse.
    pub last_pulse_us: Option<u64>,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickEvent {
    /// Nothing queued.
    Idle,
    /// A queued job became active; its first pulse comes on a later tick.
    Activated(Axis),
    /// Feed hold suspended pulse generation.
    Held,
    /// Rate gate not yet open.
    Waiting,
    /// One pulse emitted.
    Stepped,
    /// Final pulse emitted; position snapped to target.
    Completed(Axis),
    /// Limit sensor reached; motion dropped, Altitude pulled off and zeroed.
    LimitTripped(PullOff),
    /// Abort observed after a pulse; motion dropped.
    Aborted,
}

/// Two-axis constant-rate motion engine.
///
/// Generic over:
/// - `STEP`/`DIR`: output pin types shared by both axes
/// - `TIMER`: delay provider and microsecond clock
/// - `DRV`: driver control layer (defaults to [`NoDriverControl`])
pub struct MotionEngine<STEP, DIR, TIMER, DRV = NoDriverControl>
where
    STEP: OutputPin,
    DIR: OutputPin,
    TIMER: DelayNs + Clock,
    DRV: DriverControl,
{
    outputs: [StepperAxis<STEP, DIR>; 2],
    axes: [AxisState; 2],
    converter: UnitConverter,
    queue: JobQueue,
    active: Option<ActiveMove>,
    timing: TimingConfig,
    homing: HomingConfig,
    timer: TIMER,
    driver: DRV,
}

impl<STEP, DIR, TIMER, DRV> MotionEngine<STEP, DIR, TIMER, DRV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    TIMER: DelayNs + Clock,
    DRV: DriverControl,
{
    /// Build the engine with both axes at position zero.
    pub fn new(
        config: &ControllerConfig,
        azimuth: (STEP, DIR),
        altitude: (STEP, DIR),
        timer: TIMER,
        driver: DRV,
    ) -> Self {
        let az = AxisState::from_config(&config.azimuth);
        let alt = AxisState::from_config(&config.altitude);
        Self {
            outputs: [
                StepperAxis::new(azimuth.0, azimuth.1, az.direction_inverted),
                StepperAxis::new(altitude.0, altitude.1, alt.direction_inverted),
            ],
            axes: [az, alt],
            converter: UnitConverter::new(&config.azimuth, &config.altitude),
            queue: JobQueue::new(),
            active: None,
            timing: config.timing,
            homing: config.homing,
            timer,
            driver,
        }
    }

    /// Energise both drivers. Called once at startup.
    pub fn enable(&mut self) -> Result<()> {
        for axis in Axis::ALL {
            self.driver.set_enabled(axis, true)?;
        }
        Ok(())
    }

    /// Current position of `axis`.
    #[inline]
    pub fn position(&self, axis: Axis) -> Degrees {
        self.axes[axis.index()].position
    }

    /// Overwrite the position of `axis`.
    #[inline]
    pub fn set_position(&mut self, axis: Axis, position: Degrees) {
        self.axes[axis.index()].position = position;
    }

    /// Position and conversion constants of `axis`.
    #[inline]
    pub fn axis_state(&self, axis: Axis) -> &AxisState {
        &self.axes[axis.index()]
    }

    /// Degree/step conversion constants.
    #[inline]
    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// The move being stepped, if any.
    #[inline]
    pub fn active(&self) -> Option<&ActiveMove> {
        self.active.as_ref()
    }

    /// A move is being stepped.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// A move is being stepped or one is queued to follow.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// Number of jobs waiting.
    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Access the timer, e.g. to share it with other blocking code.
    pub fn timer(&mut self) -> &mut TIMER {
        &mut self.timer
    }

    /// Create a job for `axis`, snapshotting its conversion factor.
    pub fn job(&self, axis: Axis, delta: Degrees) -> MotionJob {
        MotionJob::new(axis, delta, self.converter.steps_per_degree(axis))
    }

    /// Queue a job. Returns `false` if the queue was full and the job dropped.
    pub fn enqueue(&mut self, job: MotionJob) -> bool {
        let accepted = self.queue.enqueue(job);
        if !accepted {
            warn!("queue full, dropping {} job of {}", job.axis, job.delta.0);
        }
        accepted
    }

    /// Activate the next job if nothing is active.
    ///
    /// Jobs that round to zero steps are discarded on the way. Returns
    /// whether a move is active afterwards.
    pub fn start(&mut self) -> Result<bool> {
        if self.active.is_some() {
            return Ok(true);
        }
        while let Some(job) = self.queue.dequeue() {
            if self.activate(job)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn activate(&mut self, job: MotionJob) -> Result<bool> {
        let steps = Steps::from_degrees(job.delta, job.steps_per_degree);
        if steps.is_zero() {
            debug!("skipping zero-step {} job", job.axis);
            return Ok(false);
        }

        let Ok(count) = u32::try_from(steps.abs()) else {
            warn!("dropping {} job: {} steps out of range", job.axis, steps.value());
            return Ok(false);
        };

        let i = job.axis.index();
        let direction = Direction::from_delta(job.delta.0);
        self.outputs[i].set_direction(direction)?;
        self.driver.sync_direction(job.axis, direction)?;
        self.timer.delay_us(self.timing.direction_setup_us);

        let target = self.axes[i].position + job.delta;
        self.active = Some(ActiveMove {
            axis: job.axis,
            direction,
            steps_remaining: count,
            degrees_per_step: job.delta.0 / count as f32,
            target,
            last_pulse_us: None,
        });

        info!("{} move of {} steps to {}", job.axis, count, target.0);
        Ok(true)
    }

    /// Finish any active move instantly at its target and drop the queue.
    ///
    /// Used when a new jog replaces motion in flight.
    pub fn preempt(&mut self) {
        if let Some(active) = self.active.take() {
            self.axes[active.axis.index()].position = active.target;
            debug!("pre-empted {} move", active.axis);
        }
        self.queue.clear();
    }

    /// Drop the active move where it stands and clear the queue.
    pub fn stop(&mut self) {
        self.active = None;
        self.queue.clear();
    }

    /// Advance the engine by at most one pulse.
    pub fn tick<LIMIT: InputPin>(
        &mut self,
        flags: &ControlFlags,
        safety: &mut SafetyMonitor<LIMIT>,
    ) -> Result<TickEvent> {
        let Some(active) = self.active.as_mut() else {
            self.start()?;
            return Ok(match self.active {
                Some(active) => TickEvent::Activated(active.axis),
                None => TickEvent::Idle,
            });
        };

        if flags.feed_hold {
            return Ok(TickEvent::Held);
        }

        let now = self.timer.now_us();
        if let Some(last) = active.last_pulse_us {
            if now.saturating_sub(last) < u64::from(self.timing.step_interval_us) {
                return Ok(TickEvent::Waiting);
            }
        }

        let i = active.axis.index();
        self.outputs[i].pulse(&mut self.timer, self.timing.pulse_width_us)?;
        active.last_pulse_us = Some(now);
        active.steps_remaining -= 1;
        let state = &mut self.axes[i];
        state.position = Degrees(state.position.0 + active.degrees_per_step);

        let ActiveMove {
            axis,
            direction,
            steps_remaining,
            target,
            ..
        } = *active;

        match safety.check_after_step(axis, direction, flags)? {
            SafetyStatus::LimitTripped => {
                self.stop();
                error!("limit sensor triggered during {} move", axis);
                let pull_off = self.homing_drive(safety).pull_off()?;
                self.axes[Axis::Altitude.index()].position = Degrees(0.0);
                return Ok(TickEvent::LimitTripped(pull_off));
            }
            SafetyStatus::AbortRequested => {
                self.stop();
                warn!("abort during {} move", axis);
                return Ok(TickEvent::Aborted);
            }
            SafetyStatus::Ok => {}
        }

        if steps_remaining == 0 {
            self.axes[i].position = target;
            self.active = None;
            debug!("{} move complete at {}", axis, target.0);
            self.start()?;
            return Ok(TickEvent::Completed(axis));
        }

        Ok(TickEvent::Stepped)
    }

    /// Hand the Altitude outputs to a blocking routine.
    pub fn homing_drive<'a, LIMIT: InputPin>(
        &'a mut self,
        safety: &'a mut SafetyMonitor<LIMIT>,
    ) -> HomingDrive<'a, STEP, DIR, TIMER, DRV, LIMIT> {
        let steps_per_degree = self.converter.steps_per_degree(Axis::Altitude);
        let [_, altitude] = &mut self.outputs;
        HomingDrive::new(
            altitude,
            &mut self.driver,
            &mut self.timer,
            safety,
            self.homing,
            self.timing,
            steps_per_degree,
        )
    }

    /// Give the pins, timer and driver layer back.
    pub fn release(self) -> ([(STEP, DIR); 2], TIMER, DRV) {
        let [az, alt] = self.outputs;
        ([az.release(), alt.release()], self.timer, self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use crate::error::{Error, MotorError};

    struct NullPin;

    impl ErrorType for NullPin {
        type Error = Infallible;
    }

    impl OutputPin for NullPin {
        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            Ok(())
        }

        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            Ok(())
        }
    }

    /// STEP output whose writes always fail.
    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_high(&mut self) -> core::result::Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }

        fn set_low(&mut self) -> core::result::Result<(), ErrorKind> {
            Err(ErrorKind::Other)
        }
    }

    /// Input stuck at one level.
    struct Level(bool);

    impl ErrorType for Level {
        type Error = Infallible;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    /// Clock advanced only by delays and explicit `advance` calls.
    #[derive(Default)]
    struct SimTimer {
        ns: u64,
    }

    impl SimTimer {
        fn advance(&mut self, us: u64) {
            self.ns += us * 1_000;
        }
    }

    impl DelayNs for SimTimer {
        fn delay_ns(&mut self, ns: u32) {
            self.ns += u64::from(ns);
        }
    }

    impl Clock for SimTimer {
        fn now_us(&self) -> u64 {
            self.ns / 1_000
        }
    }

    type Engine = MotionEngine<NullPin, NullPin, SimTimer>;

    fn engine() -> (Engine, SafetyMonitor<Level>) {
        let config = ControllerConfig::default();
        let engine = MotionEngine::new(
            &config,
            (NullPin, NullPin),
            (NullPin, NullPin),
            SimTimer::default(),
            NoDriverControl,
        );
        // Active-low sensor reading high: never triggered.
        (engine, SafetyMonitor::new(Level(true), true))
    }

    fn run_to_idle(engine: &mut Engine, safety: &mut SafetyMonitor<Level>, flags: &ControlFlags) {
        let mut guard = 0u32;
        while engine.is_moving() {
            engine.timer().advance(500);
            engine.tick(flags, safety).unwrap();
            guard += 1;
            assert!(guard < 100_000, "engine never went idle");
        }
    }

    #[test]
    fn test_move_lands_exactly_on_target() {
        let (mut engine, mut safety) = engine();
        let flags = ControlFlags::default();
        engine.set_position(Axis::Altitude, Degrees(10.0));

        let job = engine.job(Axis::Altitude, Degrees(-6.5));
        assert!(engine.enqueue(job));
        run_to_idle(&mut engine, &mut safety, &flags);

        assert_eq!(engine.position(Axis::Altitude), Degrees(3.5));
        assert_eq!(engine.position(Axis::Azimuth), Degrees(0.0));
    }

    #[test]
    fn test_zero_step_job_skipped() {
        let (mut engine, _safety) = engine();
        let tiny = engine.job(Axis::Azimuth, Degrees(0.0001));
        let real = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(tiny);
        engine.enqueue(real);

        assert!(engine.start().unwrap());
        let active = engine.active().unwrap();
        assert_eq!(active.steps_remaining, 889);
        assert_eq!(engine.queued(), 0);
    }

    #[test]
    fn test_only_zero_step_jobs_leave_engine_idle() {
        let (mut engine, _safety) = engine();
        let tiny = engine.job(Axis::Azimuth, Degrees(0.0001));
        engine.enqueue(tiny);

        assert!(!engine.start().unwrap());
        assert!(!engine.is_moving());
        assert_eq!(engine.position(Axis::Azimuth), Degrees(0.0));
    }

    #[test]
    fn test_rate_gate_spaces_pulses() {
        let (mut engine, mut safety) = engine();
        let flags = ControlFlags::default();
        let job = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(job);

        assert_eq!(
            engine.tick(&flags, &mut safety).unwrap(),
            TickEvent::Activated(Axis::Azimuth)
        );
        assert_eq!(engine.tick(&flags, &mut safety).unwrap(), TickEvent::Stepped);
        assert_eq!(engine.tick(&flags, &mut safety).unwrap(), TickEvent::Waiting);

        engine.timer().advance(500);
        assert_eq!(engine.tick(&flags, &mut safety).unwrap(), TickEvent::Stepped);
        assert_eq!(engine.active().unwrap().steps_remaining, 887);
    }

    #[test]
    fn test_feed_hold_freezes_position() {
        let (mut engine, mut safety) = engine();
        let mut flags = ControlFlags::default();
        let job = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(job);
        engine.start().unwrap();
        engine.tick(&flags, &mut safety).unwrap();

        flags.feed_hold = true;
        let held_at = engine.position(Axis::Azimuth);
        for _ in 0..10 {
            engine.timer().advance(500);
            assert_eq!(engine.tick(&flags, &mut safety).unwrap(), TickEvent::Held);
        }
        assert_eq!(engine.position(Axis::Azimuth), held_at);
        assert!(engine.is_moving());

        flags.feed_hold = false;
        run_to_idle(&mut engine, &mut safety, &flags);
        assert_eq!(engine.position(Axis::Azimuth), Degrees(1.0));
    }

    #[test]
    fn test_preempt_snaps_active_move_and_clears_queue() {
        let (mut engine, mut safety) = engine();
        let flags = ControlFlags::default();
        let first = engine.job(Axis::Azimuth, Degrees(2.0));
        let second = engine.job(Axis::Altitude, Degrees(1.0));
        engine.enqueue(first);
        engine.enqueue(second);
        engine.start().unwrap();
        engine.tick(&flags, &mut safety).unwrap();

        engine.preempt();

        assert!(!engine.is_moving());
        assert_eq!(engine.position(Axis::Azimuth), Degrees(2.0));
        assert_eq!(engine.position(Axis::Altitude), Degrees(0.0));
    }

    #[test]
    fn test_abort_drops_motion_after_pulse() {
        let (mut engine, mut safety) = engine();
        let flags = ControlFlags {
            feed_hold: false,
            abort_requested: true,
        };
        let job = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(job);
        engine.start().unwrap();

        assert_eq!(engine.tick(&flags, &mut safety).unwrap(), TickEvent::Aborted);
        assert!(!engine.is_moving());
    }

    #[test]
    fn test_limit_trip_zeroes_altitude_only() {
        let config = ControllerConfig::default();
        let mut engine: Engine = MotionEngine::new(
            &config,
            (NullPin, NullPin),
            (NullPin, NullPin),
            SimTimer::default(),
            NoDriverControl,
        );
        // Sensor reads low: triggered for the whole test.
        let mut safety = SafetyMonitor::new(Level(false), true);
        let flags = ControlFlags::default();
        engine.set_position(Axis::Azimuth, Degrees(45.0));
        engine.set_position(Axis::Altitude, Degrees(5.0));

        let job = engine.job(Axis::Altitude, Degrees(-1.0));
        engine.enqueue(job);
        engine.start().unwrap();

        match engine.tick(&flags, &mut safety).unwrap() {
            TickEvent::LimitTripped(pull_off) => {
                assert!(!pull_off.released);
                assert_eq!(
                    pull_off.steps,
                    config.homing.pull_off_max_steps + config.homing.pull_off_margin_steps
                );
            }
            other => panic!("expected limit trip, got {:?}", other),
        }
        assert!(!engine.is_moving());
        assert_eq!(engine.position(Axis::Altitude), Degrees(0.0));
        assert_eq!(engine.position(Axis::Azimuth), Degrees(45.0));
        assert_eq!(safety.trip_count(), 1);
    }

    #[test]
    fn test_failed_pulse_leaves_move_untouched() {
        let config = ControllerConfig::default();
        let mut engine: MotionEngine<BrokenPin, NullPin, SimTimer> = MotionEngine::new(
            &config,
            (BrokenPin, NullPin),
            (BrokenPin, NullPin),
            SimTimer::default(),
            NoDriverControl,
        );
        let mut safety = SafetyMonitor::new(Level(true), true);
        let flags = ControlFlags::default();
        let job = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(job);
        assert!(engine.start().unwrap());

        assert_eq!(
            engine.tick(&flags, &mut safety),
            Err(Error::Motor(MotorError::PinError))
        );
        let active = engine.active().unwrap();
        assert_eq!(active.steps_remaining, 889);
        assert_eq!(active.last_pulse_us, None);
        assert_eq!(engine.position(Axis::Azimuth), Degrees(0.0));
    }

    #[test]
    fn test_out_of_range_job_is_dropped() {
        let (mut engine, _safety) = engine();
        let huge = engine.job(Axis::Azimuth, Degrees(1.0e10));
        let real = engine.job(Axis::Azimuth, Degrees(1.0));
        engine.enqueue(huge);
        engine.enqueue(real);

        assert!(engine.start().unwrap());
        assert_eq!(engine.active().unwrap().steps_remaining, 889);
        assert_eq!(engine.position(Axis::Azimuth), Degrees(0.0));
    }
}
