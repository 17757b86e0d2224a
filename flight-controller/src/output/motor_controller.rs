use embedded_hal::pwm::{Error as _, SetDutyCycle};

use crate::{
    config::constants::PWM_CARRIER_US,
    util::error::{FlightError, FlightResult},
};

/// A PWM output driven by pulse width in microseconds on a fixed carrier.
///
/// Used both for the ESCs (1000..=2000us) and the sensor heater
/// (0..=2999us). Commands are offsets above `min_pulse_width`, clamped to the
/// channel's range.
pub struct PulseWidthChannel<P>
where
    P: SetDutyCycle,
{
    pwm_driver: P,
    min_pulse_width: u16,
    max_pulse_width: u16,
    pulse_width: u16,
}

impl<P> PulseWidthChannel<P>
where
    P: SetDutyCycle,
{
    pub fn new(pwm_driver: P, min_pulse_width: u16, max_pulse_width: u16) -> FlightResult<Self> {
        let mut channel = PulseWidthChannel {
            pwm_driver,
            min_pulse_width,
            max_pulse_width,
            pulse_width: min_pulse_width,
        };
        channel.write_pulse_width(min_pulse_width)?;
        Ok(channel)
    }

    /// Sets the pulse to `min_pulse_width + offset`, clamped.
    pub fn update(&mut self, offset: i64) -> FlightResult<u16> {
        let pulse_width = (self.min_pulse_width as i64)
            .saturating_add(offset)
            .clamp(self.min_pulse_width as i64, self.max_pulse_width as i64)
            as u16;
        self.write_pulse_width(pulse_width)?;
        Ok(pulse_width)
    }

    pub fn pulse_width(&self) -> u16 {
        self.pulse_width
    }

    fn write_pulse_width(&mut self, pulse_width: u16) -> FlightResult<()> {
        self.pwm_driver
            .set_duty_cycle_fraction(pulse_width, PWM_CARRIER_US)
            .map_err(|error| FlightError::Actuator(format!("{:?}", error.kind())))?;
        self.pulse_width = pulse_width;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePwm;

    #[test]
    fn starts_at_minimum_and_clamps_updates() {
        let pwm = FakePwm::new();
        let mut channel = PulseWidthChannel::new(pwm.clone(), 1000, 2000).unwrap();
        assert_eq!(pwm.pulse_width(), 1000);

        assert_eq!(channel.update(250).unwrap(), 1250);
        assert_eq!(pwm.pulse_width(), 1250);
        assert_eq!(channel.update(5000).unwrap(), 2000);
        assert_eq!(channel.update(-40).unwrap(), 1000);
        assert_eq!(channel.pulse_width(), 1000);

        assert_eq!(channel.update(i64::MAX).unwrap(), 2000);
        assert_eq!(channel.update(i64::MIN).unwrap(), 1000);
    }

    #[test]
    fn driver_errors_are_reported() {
        let pwm = FakePwm::new();
        let mut channel = PulseWidthChannel::new(pwm.clone(), 0, 2999).unwrap();
        pwm.fail_writes();
        assert!(matches!(channel.update(10), Err(FlightError::Actuator(_))));
        assert_eq!(channel.pulse_width(), 0);
    }
}
