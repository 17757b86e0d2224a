//! Raspberry Pi wiring: I2C for the MPU-6050, GPIO for its data-ready line
//! and software PWM for the ESCs and the heater.

use std::time::Duration;

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use rppal::{
    gpio::{Gpio, OutputPin},
    hal::Delay,
    i2c::I2c,
};

use crate::{
    app_context::AppContext,
    config::{
        constants::{
            ESC_MAX_PULSE_WIDTH, ESC_MIN_PULSE_WIDTH, HEATER_MAX_PULSE_WIDTH,
            HEATER_MIN_PULSE_WIDTH, PWM_CARRIER_US,
        },
        FlightConfig,
    },
    control::thermal::ThermalRegulator,
    drivers::mpu_6050::device::MPU6050Sensor,
    inertial_measurement::CalibratedSensor,
    output::{
        motor_controller::PulseWidthChannel,
        motors_state_manager::{MotorChannel, QuadcopterMotorsStateManager},
        vehicle_movement_mappers::STANDARD_LAYOUT,
    },
    shared_core_values::CancellationToken,
    util::{
        error::{FlightError, FlightResult},
        time::{Clock, SystemClock},
    },
};

/// A GPIO pin driven with rppal's software PWM on the 3ms carrier. One
/// duty step is one microsecond.
pub struct SoftPwm {
    pin: OutputPin,
}

impl SoftPwm {
    pub fn new(pin: OutputPin) -> Self {
        SoftPwm { pin }
    }
}

impl ErrorType for SoftPwm {
    type Error = ErrorKind;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        PWM_CARRIER_US
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.pin
            .set_pwm(
                Duration::from_micros(PWM_CARRIER_US as u64),
                Duration::from_micros(duty as u64),
            )
            .map_err(|_| ErrorKind::Other)
    }
}

fn hardware_error(error: impl std::fmt::Display) -> FlightError {
    FlightError::Hardware(error.to_string())
}

fn output_pin(gpio: &Gpio, pin: u8) -> FlightResult<SoftPwm> {
    let pin = gpio.get(pin).map_err(hardware_error)?.into_output_low();
    Ok(SoftPwm::new(pin))
}

/// Keeps the whole process resident so the control loop never waits on a
/// page fault. Needs root; without it the flight goes ahead unlocked.
fn lock_memory() {
    // SAFETY: mlockall takes no pointers.
    if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } != 0 {
        log::error!(
            "Could not lock memory: {}",
            std::io::Error::last_os_error()
        );
    }
}

/// Claims the hardware, runs the selected mode and shuts down in order.
/// ESCs and heater are driven to their minimum before the sensor is touched.
pub fn run(config: FlightConfig, cancellation: CancellationToken) -> FlightResult<()> {
    let gpio = Gpio::new().map_err(hardware_error)?;
    let pins = config.pins;

    let motor_pins = [
        pins.front_left,
        pins.front_right,
        pins.back_left,
        pins.back_right,
    ];
    let mut channels = Vec::with_capacity(4);
    for (index, pin) in motor_pins.into_iter().enumerate() {
        channels.push(MotorChannel {
            location: STANDARD_LAYOUT[index].0,
            rotation: STANDARD_LAYOUT[index].1,
            controller: PulseWidthChannel::new(
                output_pin(&gpio, pin)?,
                ESC_MIN_PULSE_WIDTH,
                ESC_MAX_PULSE_WIDTH,
            )?,
        });
    }
    let channels: [MotorChannel<SoftPwm>; 4] = channels
        .try_into()
        .map_err(|_| FlightError::MotorLayout("expected four motors".to_string()))?;
    let motors = QuadcopterMotorsStateManager::new(channels)?;

    let heater = PulseWidthChannel::new(
        output_pin(&gpio, pins.heater)?,
        HEATER_MIN_PULSE_WIDTH,
        HEATER_MAX_PULSE_WIDTH,
    )?;

    let data_ready = gpio
        .get(pins.data_ready)
        .map_err(hardware_error)?
        .into_input();
    let i2c = I2c::new().map_err(hardware_error)?;
    let mut mpu = MPU6050Sensor::new(i2c, data_ready);
    mpu.init(&mut Delay::new(), config.dlpf)?;

    let clock = SystemClock::new();
    let thermal = ThermalRegulator::new(heater, clock.now());
    let sensor = CalibratedSensor::new(mpu, clock, config.calibration);

    lock_memory();
    let mut context = AppContext::new(config, sensor, motors, thermal, cancellation);
    let result = context.run();
    let shutdown = context.shutdown();
    result.and(shutdown)
}
