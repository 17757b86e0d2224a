use shared_definitions::controller::PIDTuneConfig;

use super::integrator::Integrator;

/// The gain-scaled terms of one PID update. Callers sum and clamp them.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PIDOutput {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl PIDOutput {
    pub fn sum(&self) -> f64 {
        self.proportional + self.integral + self.derivative
    }
}

pub struct PID {
    last_error: f64,
    last_time: f64,
    proportional_multiplier: f64,
    integral_multiplier: f64,
    derivative_multiplier: f64,
    error_integrator: Integrator,
}

impl PID {
    pub fn new(
        proportional_multiplier: f64,
        integral_multiplier: f64,
        derivative_multiplier: f64,
        now: f64,
    ) -> Self {
        PID {
            last_error: 0.0_f64,
            last_time: now,
            proportional_multiplier,
            integral_multiplier,
            derivative_multiplier,
            error_integrator: Integrator::new(),
        }
    }

    pub fn from_config(config: &PIDTuneConfig, now: f64) -> Self {
        Self::new(
            config.proportional_multiplier,
            config.integral_multiplier,
            config.derivative_multiplier,
            now,
        )
    }

    /// One update at time `now` (seconds). The integral is trapezoidal but
    /// keeps the sum of both errors rather than their mean, so integral gains
    /// are tuned against twice the area. `now` must move forward: there is no
    /// guard on the derivative's division.
    pub fn update(&mut self, measured_state: f64, desired_state: f64, now: f64) -> PIDOutput {
        let iteration_length = now - self.last_time;
        let error = desired_state - measured_state;

        let accumulated_error = self
            .error_integrator
            .add_new_value(error + self.last_error, iteration_length);
        let change_rate = (error - self.last_error) / iteration_length;

        self.last_error = error;
        self.last_time = now;

        PIDOutput {
            proportional: error * self.proportional_multiplier,
            integral: accumulated_error * self.integral_multiplier,
            derivative: change_rate * self.derivative_multiplier,
        }
    }
}
