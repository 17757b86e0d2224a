use crate::util::math::vectors::Vector3D;

pub struct Integrator {
    current_value: f64,
}

impl Integrator {
    pub fn new() -> Self {
        Integrator {
            current_value: 0.0_f64,
        }
    }

    pub fn add_new_value(&mut self, value: f64, interval_seconds: f64) -> f64 {
        self.current_value += value * interval_seconds;
        self.current_value
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Time-weighted sums of raw sensor readings between two motion updates.
///
/// The sums only mean something once divided by the elapsed time, see
/// [`IntegrationAccumulator::average`].
#[derive(Debug, Default, Clone)]
pub struct IntegrationAccumulator {
    accel: Vector3D,
    gyro: Vector3D,
    elapsed: f64,
}

impl IntegrationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one raw reading held for `interval_seconds`.
    pub fn add_sample(&mut self, accel: Vector3D, gyro: Vector3D, interval_seconds: f64) {
        self.accel += accel * interval_seconds;
        self.gyro += gyro * interval_seconds;
        self.elapsed += interval_seconds;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Time-averaged (accel, gyro) raw readings. Both are zero if nothing was
    /// integrated.
    pub fn average(&self) -> (Vector3D, Vector3D) {
        if self.elapsed <= 0.0 {
            return (Vector3D::default(), Vector3D::default());
        }
        (self.accel / self.elapsed, self.gyro / self.elapsed)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn integrator_sums_value_times_interval() {
        let mut integrator = Integrator::new();
        assert_relative_eq!(integrator.add_new_value(2.0, 0.5), 1.0);
        assert_relative_eq!(integrator.add_new_value(4.0, 0.25), 2.0);
    }

    #[test]
    fn accumulator_weights_samples_by_time() {
        let mut accumulator = IntegrationAccumulator::new();
        accumulator.add_sample(Vector3D::new(100.0, 0.0, 0.0), Vector3D::new(0.0, 10.0, 0.0), 0.003);
        accumulator.add_sample(Vector3D::new(200.0, 0.0, 0.0), Vector3D::new(0.0, 20.0, 0.0), 0.001);

        let (accel, gyro) = accumulator.average();
        assert_relative_eq!(accel.x, 125.0, epsilon = 1e-9);
        assert_relative_eq!(gyro.y, 12.5, epsilon = 1e-9);
        assert_relative_eq!(accumulator.elapsed(), 0.004, epsilon = 1e-12);

        accumulator.reset();
        assert_eq!(accumulator.average(), (Vector3D::default(), Vector3D::default()));
    }
}
