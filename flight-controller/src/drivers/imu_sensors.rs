use crate::util::math::vectors::Vector3D;

/// Three signed 16 bit axis readings, straight from the sensor registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawAxes {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawAxes {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        RawAxes { x, y, z }
    }

    pub fn to_vector(&self) -> Vector3D {
        Vector3D::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

/// One block read of the sensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    pub accel: RawAxes,
    pub gyro: RawAxes,
    /// Die temperature, raw units. °C = raw / 340 + 36.53
    pub temperature: i16,
}

/// A reading stamped with the time it arrived, in seconds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub reading: RawReading,
    pub timestamp: f64,
}

impl RawSample {
    pub fn temperature(&self) -> i16 {
        self.reading.temperature
    }
}

/// Transient failures the driver absorbed by retrying.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SensorMisses {
    pub bus: u64,
    pub data_ready: u64,
}

/// A six axis sensor with a data-ready signal.
///
/// Both calls block until they succeed; transient errors are retried and
/// counted in [`InertialSensor::misses`].
pub trait InertialSensor {
    /// Blocks until the sensor flags a new sample. There is no timeout.
    fn wait_for_sample(&mut self);
    fn read_raw(&mut self) -> RawReading;
    fn misses(&self) -> SensorMisses;
}
