use crate::{
    config::constants::{SCALE_ACCEL, SCALE_GYRO, TEMPERATURE_OFFSET_C, TEMPERATURE_SCALE},
    drivers::imu_sensors::{InertialSensor, RawSample, SensorMisses},
    util::{error::FlightResult, math::vectors::Vector3D, time::Clock},
};

/// Per-axis corrections applied to raw readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    pub accel_offset: Vector3D,
    pub accel_gain: Vector3D,
    pub gyro_bias: Vector3D,
}

impl CalibrationProfile {
    pub fn identity() -> Self {
        CalibrationProfile {
            accel_offset: Vector3D::default(),
            accel_gain: Vector3D::new(1.0, 1.0, 1.0),
            gyro_bias: Vector3D::default(),
        }
    }

    pub fn with_accel(accel_offset: Vector3D, accel_gain: Vector3D) -> Self {
        CalibrationProfile {
            accel_offset,
            accel_gain,
            ..Self::identity()
        }
    }

    /// Raw (possibly time averaged) readings to g and rad/s.
    pub fn correct(&self, accel: &Vector3D, gyro: &Vector3D) -> CorrectedSample {
        CorrectedSample {
            accel: Vector3D::new(
                (accel.x + self.accel_offset.x) * self.accel_gain.x * SCALE_ACCEL,
                (accel.y + self.accel_offset.y) * self.accel_gain.y * SCALE_ACCEL,
                (accel.z + self.accel_offset.z) * self.accel_gain.z * SCALE_ACCEL,
            ),
            gyro: (*gyro - self.gyro_bias) * SCALE_GYRO,
        }
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::identity()
    }
}

/// Body frame acceleration in g and rotation rates in rad/s.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CorrectedSample {
    pub accel: Vector3D,
    pub gyro: Vector3D,
}

/// Averaged raw gravity at a given die temperature, appended to the offsets
/// file so accelerometer offsets and gains can be fitted offline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityCalibration {
    pub temperature_raw: i16,
    pub temperature_c: f64,
    pub gravity: Vector3D,
}

pub fn temperature_celsius(raw: i16) -> f64 {
    raw as f64 / TEMPERATURE_SCALE + TEMPERATURE_OFFSET_C
}

/// The sensor, the clock that stamps its samples and the calibration that
/// corrects them.
pub struct CalibratedSensor<S, C>
where
    S: InertialSensor,
    C: Clock,
{
    sensor: S,
    clock: C,
    profile: CalibrationProfile,
}

impl<S, C> CalibratedSensor<S, C>
where
    S: InertialSensor,
    C: Clock,
{
    pub fn new(sensor: S, clock: C, profile: CalibrationProfile) -> Self {
        CalibratedSensor {
            sensor,
            clock,
            profile,
        }
    }

    /// Waits for data-ready, reads the block and stamps it.
    pub fn next_sample(&mut self) -> RawSample {
        self.sensor.wait_for_sample();
        let reading = self.sensor.read_raw();
        RawSample {
            reading,
            timestamp: self.clock.now(),
        }
    }

    pub fn correct(&self, accel: &Vector3D, gyro: &Vector3D) -> CorrectedSample {
        self.profile.correct(accel, gyro)
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn misses(&self) -> SensorMisses {
        self.sensor.misses()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Averages `iterations` samples into the gyro bias. The airframe must be
    /// still. `on_sample` sees every sample, e.g. to keep the heater running.
    pub fn calibrate_gyro_bias<F>(&mut self, iterations: usize, mut on_sample: F) -> FlightResult<()>
    where
        F: FnMut(&RawSample) -> FlightResult<()>,
    {
        let mut sum = Vector3D::default();
        for _ in 0..iterations {
            let sample = self.next_sample();
            on_sample(&sample)?;
            sum += sample.reading.gyro.to_vector();
        }
        self.profile.gyro_bias = sum / iterations as f64;
        log::info!("Gyro bias {:?}", self.profile.gyro_bias);
        Ok(())
    }

    /// Drops the accelerometer corrections and averages `iterations` raw
    /// samples. The result is uncorrected so it can be fitted offline.
    pub fn calibrate_gravity<F>(
        &mut self,
        iterations: usize,
        mut on_sample: F,
    ) -> FlightResult<GravityCalibration>
    where
        F: FnMut(&RawSample) -> FlightResult<()>,
    {
        self.profile.accel_offset = Vector3D::default();
        self.profile.accel_gain = Vector3D::new(1.0, 1.0, 1.0);

        let mut sum = Vector3D::default();
        let mut temperature_raw = 0;
        for _ in 0..iterations {
            let sample = self.next_sample();
            on_sample(&sample)?;
            sum += sample.reading.accel.to_vector();
            temperature_raw = sample.temperature();
        }

        Ok(GravityCalibration {
            temperature_raw,
            temperature_c: temperature_celsius(temperature_raw),
            gravity: sum / iterations as f64,
        })
    }
}
