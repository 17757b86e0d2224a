//! Fakes for the hardware seams, shared by unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};

use crate::{
    drivers::imu_sensors::{InertialSensor, RawAxes, RawReading, SensorMisses},
    shared_core_values::CancellationToken,
    util::time::Clock,
};

#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn sleep(&self, seconds: f64) {
        self.advance(seconds);
    }
}

#[derive(Default)]
struct FakePwmState {
    duty: u16,
    history: Vec<u16>,
    failing: bool,
    cancel_on: Option<(u16, CancellationToken)>,
}

/// PWM whose duty range equals the 3000us carrier, so duty == pulse width.
#[derive(Clone, Default)]
pub struct FakePwm {
    state: Rc<RefCell<FakePwmState>>,
}

impl FakePwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulse_width(&self) -> u16 {
        self.state.borrow().duty
    }

    pub fn history(&self) -> Vec<u16> {
        self.state.borrow().history.clone()
    }

    pub fn fail_writes(&self) {
        self.state.borrow_mut().failing = true;
    }

    /// Cancels `token` as soon as `pulse_width` is written.
    pub fn cancel_on_write(&self, pulse_width: u16, token: CancellationToken) {
        self.state.borrow_mut().cancel_on = Some((pulse_width, token));
    }
}

impl ErrorType for FakePwm {
    type Error = ErrorKind;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        3000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.failing {
            return Err(ErrorKind::Other);
        }
        state.duty = duty;
        state.history.push(duty);
        if let Some((width, token)) = &state.cancel_on {
            if *width == duty {
                token.cancel();
            }
        }
        Ok(())
    }
}

/// A motionless sensor sampling at 1kHz on a [`FakeClock`].
///
/// Reads level gravity (+1g on z) and the heater set point unless queued
/// temperatures say otherwise.
pub struct FakeSensor {
    clock: FakeClock,
    reading: RawReading,
    temperatures: VecDeque<i16>,
    reads: usize,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeSensor {
    pub const SAMPLE_PERIOD: f64 = 0.001;

    pub fn new(clock: FakeClock) -> Self {
        FakeSensor {
            clock,
            reading: RawReading {
                accel: RawAxes::new(0, 0, 16384),
                gyro: RawAxes::new(0, 0, 0),
                temperature: 1180,
            },
            temperatures: VecDeque::new(),
            reads: 0,
            cancel_after: None,
        }
    }

    pub fn with_reading(mut self, reading: RawReading) -> Self {
        self.reading = reading;
        self
    }

    pub fn with_temperatures(mut self, temperatures: &[i16]) -> Self {
        self.temperatures = temperatures.iter().copied().collect();
        self
    }

    /// Cancels `token` on the `reads`th read, as Ctrl-C would mid-run.
    pub fn cancel_after(mut self, reads: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((reads, token));
        self
    }
}

impl InertialSensor for FakeSensor {
    fn wait_for_sample(&mut self) {
        self.clock.advance(Self::SAMPLE_PERIOD);
    }

    fn read_raw(&mut self) -> RawReading {
        self.reads += 1;
        if let Some((after, token)) = &self.cancel_after {
            if self.reads == *after {
                token.cancel();
            }
        }
        let mut reading = self.reading;
        if let Some(temperature) = self.temperatures.pop_front() {
            reading.temperature = temperature;
        }
        reading
    }

    fn misses(&self) -> SensorMisses {
        SensorMisses::default()
    }
}
