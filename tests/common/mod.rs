//! Simulated hardware for controller-level tests.
//!
//! Pins and the timer share their state through `Rc<Cell<_>>` so a test can
//! watch pulses and move the clock while the controller owns the devices.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use polar_motion::{
    Axis, ByteSource, Clock, Controller, ControllerConfig, Degrees, NoDriverControl,
};

/// Free-running clock advanced by delays and by the test.
#[derive(Clone, Default)]
pub struct SimTimer {
    ns: Rc<Cell<u64>>,
}

impl SimTimer {
    pub fn advance_us(&self, us: u64) {
        self.ns.set(self.ns.get() + us * 1_000);
    }
}

impl DelayNs for SimTimer {
    fn delay_ns(&mut self, ns: u32) {
        self.ns.set(self.ns.get() + u64::from(ns));
    }
}

impl Clock for SimTimer {
    fn now_us(&self) -> u64 {
        self.ns.get() / 1_000
    }
}

/// Hardware step counter of one axis, signed by the logical direction.
#[derive(Clone, Default)]
pub struct StepCounter {
    pub count: Rc<Cell<i64>>,
    sign: Rc<Cell<i64>>,
}

/// STEP output adding the current sign on each rising edge.
pub struct StepPin(StepCounter);

impl ErrorType for StepPin {
    type Error = Infallible;
}

impl OutputPin for StepPin {
    fn set_high(&mut self) -> Result<(), Infallible> {
        let c = &self.0;
        c.count.set(c.count.get() + c.sign.get());
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// DIR output translating the electrical level back to a logical sign.
pub struct DirPin {
    counter: StepCounter,
    inverted: bool,
}

impl DirPin {
    fn level(&mut self, high: bool) {
        let positive = high != self.inverted;
        self.counter.sign.set(if positive { 1 } else { -1 });
    }
}

impl ErrorType for DirPin {
    type Error = Infallible;
}

impl OutputPin for DirPin {
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level(false);
        Ok(())
    }
}

/// Active-low limit switch closing once the Altitude step count reaches
/// `threshold` or below.
#[derive(Clone)]
pub struct LimitSwitch {
    altitude: StepCounter,
    pub threshold: Rc<Cell<Option<i64>>>,
}

impl LimitSwitch {
    fn triggered(&self) -> bool {
        self.threshold
            .get()
            .map_or(false, |t| self.altitude.count.get() <= t)
    }
}

impl ErrorType for LimitSwitch {
    type Error = Infallible;
}

impl InputPin for LimitSwitch {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.triggered())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.triggered())
    }
}

/// Active-low push-button.
#[derive(Clone, Default)]
pub struct Button {
    pub pressed: Rc<Cell<bool>>,
}

impl ErrorType for Button {
    type Error = Infallible;
}

impl InputPin for Button {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.pressed.get())
    }
}

/// Host serial line delivering bytes once the simulated clock reaches their
/// arrival time.
pub struct HostLink {
    timer: SimTimer,
    pending: VecDeque<(u64, u8)>,
}

impl HostLink {
    fn new(timer: SimTimer) -> Self {
        Self {
            timer,
            pending: VecDeque::new(),
        }
    }

    /// Schedule `bytes` to arrive `after_us` from now.
    pub fn schedule(&mut self, after_us: u64, bytes: &[u8]) {
        let at = self.timer.now_us() + after_us;
        self.pending.extend(bytes.iter().map(|&b| (at, b)));
    }
}

impl ByteSource for HostLink {
    fn read_byte(&mut self) -> Option<u8> {
        match self.pending.front() {
            Some(&(at, byte)) if at <= self.timer.now_us() => {
                self.pending.pop_front();
                Some(byte)
            }
            _ => None,
        }
    }
}

pub type SimController = Controller<StepPin, DirPin, SimTimer, LimitSwitch, Button, NoDriverControl>;

/// A controller wired to simulated hardware plus a captured reply stream.
pub struct Rig {
    pub controller: SimController,
    pub timer: SimTimer,
    pub steps: [StepCounter; 2],
    pub limit: LimitSwitch,
    pub button: Button,
    pub host: HostLink,
    pub out: String,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let timer = SimTimer::default();
        let azimuth = StepCounter::default();
        let altitude = StepCounter::default();
        let limit = LimitSwitch {
            altitude: altitude.clone(),
            threshold: Rc::new(Cell::new(None)),
        };
        let button = Button::default();

        let mut controller = Controller::new(
            &config,
            (
                StepPin(azimuth.clone()),
                DirPin {
                    counter: azimuth.clone(),
                    inverted: config.azimuth.invert_direction,
                },
            ),
            (
                StepPin(altitude.clone()),
                DirPin {
                    counter: altitude.clone(),
                    inverted: config.altitude.invert_direction,
                },
            ),
            timer.clone(),
            NoDriverControl,
            limit.clone(),
            button.clone(),
        );
        controller.enable().unwrap();

        Self {
            controller,
            host: HostLink::new(timer.clone()),
            timer,
            steps: [azimuth, altitude],
            limit,
            button,
            out: String::new(),
        }
    }

    /// Queue host bytes.
    pub fn send(&mut self, bytes: &[u8]) {
        self.controller.receive(bytes);
    }

    /// Have `bytes` arrive on the serial line `after_us` from now, possibly
    /// while the controller is blocked homing.
    pub fn send_later(&mut self, after_us: u64, bytes: &[u8]) {
        self.host.schedule(after_us, bytes);
    }

    /// One control loop iteration after letting a step interval elapse.
    pub fn poll(&mut self) {
        self.timer.advance_us(500);
        self.controller.poll(&mut self.host, &mut self.out).unwrap();
    }

    /// Poll until nothing is active or queued.
    pub fn run_until_idle(&mut self) {
        let mut guard = 0u32;
        loop {
            self.poll();
            if !self.controller.engine().is_moving() {
                break;
            }
            guard += 1;
            assert!(guard < 1_000_000, "controller never went idle");
        }
    }

    /// Replies written since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn position(&self, axis: Axis) -> f32 {
        self.controller.position(axis).0
    }

    pub fn set_position(&mut self, axis: Axis, degrees: f32) {
        self.controller
            .engine_mut()
            .set_position(axis, Degrees(degrees));
    }

    /// Net hardware pulses emitted on `axis`.
    pub fn pulses(&self, axis: Axis) -> i64 {
        self.steps[axis.index()].count.get()
    }

    /// Close the limit switch at `steps` hardware pulses below the current
    /// Altitude count.
    pub fn place_limit_below(&mut self, steps: i64) {
        let at = self.pulses(Axis::Altitude) - steps;
        self.limit.threshold.set(Some(at));
    }
}
