use embedded_hal::pwm::SetDutyCycle;

use crate::{
    config::constants::{
        MAX_TEMPERATURE_EXCURSION, TEMPERATURE_SET_POINT, THERMAL_PID, WARM_UP_POLL_SECONDS,
        WARM_UP_TOLERANCE,
    },
    drivers::imu_sensors::InertialSensor,
    inertial_measurement::calibrated_sensor::{temperature_celsius, CalibratedSensor},
    output::motor_controller::PulseWidthChannel,
    shared_core_values::CancellationToken,
    util::{
        error::{FlightError, FlightResult},
        time::Clock,
    },
};

use super::pid::{PIDOutput, PID};

/// Holds the sensor die at a constant temperature with a heater, so the
/// accelerometer offsets stay valid through the flight.
pub struct ThermalRegulator<H>
where
    H: SetDutyCycle,
{
    pid: PID,
    heater: PulseWidthChannel<H>,
    set_point: i16,
    last_excursion_log: f64,
    excursions_reported: u32,
    last_output: PIDOutput,
}

impl<H> ThermalRegulator<H>
where
    H: SetDutyCycle,
{
    pub fn new(heater: PulseWidthChannel<H>, now: f64) -> Self {
        ThermalRegulator {
            pid: PID::from_config(&THERMAL_PID, now),
            heater,
            set_point: TEMPERATURE_SET_POINT,
            last_excursion_log: now,
            excursions_reported: 0,
            last_output: PIDOutput::default(),
        }
    }

    fn error(&self, temperature: i16) -> i32 {
        temperature as i32 - self.set_point as i32
    }

    /// Refuses to fly if the die is already too hot for the heater to help.
    pub fn preflight_check(&self, temperature: i16) -> FlightResult<()> {
        let excess = self.error(temperature);
        if excess > MAX_TEMPERATURE_EXCURSION {
            log::error!("Sorry, too warm to fly ({}oC)", temperature_celsius(temperature));
            return Err(FlightError::TooHot { excess });
        }
        Ok(())
    }

    pub fn is_warm(&self, temperature: i16) -> bool {
        self.error(temperature).abs() < WARM_UP_TOLERANCE
    }

    /// One PID step; the heater pulse is the summed output, clamped to the
    /// heater's range.
    pub fn regulate(&mut self, temperature: i16, now: f64) -> FlightResult<PIDOutput> {
        let output = self
            .pid
            .update(temperature as f64, self.set_point as f64, now);
        self.heater.update(output.sum() as i64)?;
        self.last_output = output;
        Ok(output)
    }

    /// [`Self::regulate`] plus a log line, at most once a second, while the
    /// temperature is out of range. Never aborts the flight.
    pub fn regulate_in_flight(&mut self, temperature: i16, now: f64) -> FlightResult<PIDOutput> {
        if self.error(temperature).abs() > MAX_TEMPERATURE_EXCURSION
            && now - self.last_excursion_log > 1.0
        {
            log::error!(
                "Flight temperature range exceeded: {}oC",
                temperature_celsius(temperature)
            );
            self.last_excursion_log = now;
            self.excursions_reported += 1;
        }
        self.regulate(temperature, now)
    }

    /// Blocks until the die is within tolerance of the set point.
    pub fn warm_up<S, C>(
        &mut self,
        sensor: &mut CalibratedSensor<S, C>,
        cancellation: &CancellationToken,
    ) -> FlightResult<()>
    where
        S: InertialSensor,
        C: Clock,
    {
        log::error!("Just warming up...");
        let mut last_temp_log = sensor.clock().now();
        loop {
            if cancellation.is_cancelled() {
                return Err(FlightError::Aborted);
            }
            sensor.clock().sleep(WARM_UP_POLL_SECONDS);
            let sample = sensor.next_sample();
            self.regulate(sample.temperature(), sample.timestamp)?;

            if sample.timestamp - last_temp_log > 1.0 {
                log::error!("temp {}", temperature_celsius(sample.temperature()));
                last_temp_log = sample.timestamp;
            }
            if self.is_warm(sample.temperature()) {
                return Ok(());
            }
        }
    }

    /// How many in-flight excursion warnings were logged.
    pub fn excursions_reported(&self) -> u32 {
        self.excursions_reported
    }

    pub fn last_output(&self) -> PIDOutput {
        self.last_output
    }

    pub fn heater_pulse_width(&self) -> u16 {
        self.heater.pulse_width()
    }

    pub fn heater_off(&mut self) -> FlightResult<()> {
        self.heater.update(0).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        config::constants::{HEATER_MAX_PULSE_WIDTH, HEATER_MIN_PULSE_WIDTH},
        inertial_measurement::CalibrationProfile,
        test_support::{FakeClock, FakePwm, FakeSensor},
    };

    fn regulator(pwm: &FakePwm) -> ThermalRegulator<FakePwm> {
        let heater =
            PulseWidthChannel::new(pwm.clone(), HEATER_MIN_PULSE_WIDTH, HEATER_MAX_PULSE_WIDTH)
                .unwrap();
        ThermalRegulator::new(heater, 0.0)
    }

    #[test]
    fn cold_die_drives_heater_and_saturates() {
        let pwm = FakePwm::new();
        let mut thermal = regulator(&pwm);

        let output = thermal.regulate(1080, 0.001).unwrap();
        assert_relative_eq!(output.proportional, 75.0);
        assert!(pwm.pulse_width() > 0);

        let output = thermal.regulate(-5000, 0.002).unwrap();
        assert!(output.sum() > 2999.0);
        assert_eq!(pwm.pulse_width(), 2999);
    }

    #[test]
    fn hot_die_turns_heater_off() {
        let pwm = FakePwm::new();
        let mut thermal = regulator(&pwm);
        thermal.regulate(1300, 0.001).unwrap();
        assert_eq!(pwm.pulse_width(), 0);
    }

    #[test]
    fn at_set_point_only_the_integral_remains() {
        let pwm = FakePwm::new();
        let mut thermal = regulator(&pwm);
        thermal.regulate(1150, 0.001).unwrap();
        thermal.regulate(1180, 0.002).unwrap();

        let first = thermal.regulate(1180, 0.003).unwrap();
        let second = thermal.regulate(1180, 0.004).unwrap();
        assert_eq!(first.proportional, 0.0);
        assert_eq!(first.derivative, 0.0);
        assert_eq!(second.derivative, 0.0);
        assert_relative_eq!(first.integral, second.integral);
        assert_eq!(thermal.last_output(), second);
    }

    #[test]
    fn preflight_refuses_more_than_a_degree_too_hot() {
        let thermal = regulator(&FakePwm::new());
        assert!(thermal.preflight_check(1180 + 340).is_ok());
        assert!(matches!(
            thermal.preflight_check(1180 + 341),
            Err(FlightError::TooHot { excess: 341 })
        ));
        assert!(thermal.preflight_check(0).is_ok());
    }

    #[test]
    fn warm_up_returns_once_within_tolerance() {
        let clock = FakeClock::new();
        let sensor = FakeSensor::new(clock.clone()).with_temperatures(&[1000, 1100, 1140, 1170]);
        let mut calibrated = CalibratedSensor::new(sensor, clock.clone(), CalibrationProfile::identity());
        let pwm = FakePwm::new();
        let mut thermal = regulator(&pwm);

        thermal.warm_up(&mut calibrated, &CancellationToken::new()).unwrap();

        assert_eq!(pwm.history().len(), 1 + 4);
        assert!(thermal.heater_pulse_width() > 0);
    }

    #[test]
    fn in_flight_excursion_is_logged_once_a_second_and_never_aborts() {
        let pwm = FakePwm::new();
        let mut thermal = regulator(&pwm);

        for step in 1..=10 {
            let now = step as f64 * 0.3;
            assert!(thermal.regulate_in_flight(2000, now).is_ok());
        }
        // Reported at 1.2s and 2.4s only.
        assert_eq!(thermal.excursions_reported(), 2);
        assert_eq!(pwm.pulse_width(), 0);

        thermal.regulate_in_flight(1180, 3.3).unwrap();
        assert_eq!(thermal.excursions_reported(), 2);
    }

    #[test]
    fn warm_up_stops_when_cancelled() {
        let clock = FakeClock::new();
        let sensor = FakeSensor::new(clock.clone()).with_temperatures(&[1000]);
        let mut calibrated = CalibratedSensor::new(sensor, clock, CalibrationProfile::identity());
        let mut thermal = regulator(&FakePwm::new());
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        assert!(matches!(
            thermal.warm_up(&mut calibrated, &cancellation),
            Err(FlightError::Aborted)
        ));
    }
}
