use crate::util::math::{
    frames::GravityAngles,
    vectors::RotationVector3D,
};

/// Fused attitude in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    /// Pure gyro integral, it drifts for lack of an absolute heading.
    pub yaw: f64,
}

/// Complementary filter blending integrated Euler rates with the attitude
/// implied by gravity. `tau` is the time constant in seconds; larger values
/// trust the gyro for longer.
pub struct AttitudeEstimator {
    tau: f64,
    orientation: Orientation,
}

impl AttitudeEstimator {
    pub fn new(tau: f64, initial: Orientation) -> Self {
        AttitudeEstimator {
            tau,
            orientation: initial,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// `euler_rates` drive pitch and roll; yaw integrates the body z rate
    /// directly.
    pub fn update(
        &mut self,
        euler_rates: &RotationVector3D,
        body_yaw_rate: f64,
        gravity_angles: &GravityAngles,
        interval_seconds: f64,
    ) -> Orientation {
        let fraction = self.tau / (self.tau + interval_seconds);
        let current = &mut self.orientation;

        current.pitch = fraction * (current.pitch + euler_rates.pitch * interval_seconds)
            + (1.0 - fraction) * gravity_angles.pitch;
        current.roll = fraction * (current.roll + euler_rates.roll * interval_seconds)
            + (1.0 - fraction) * gravity_angles.roll;
        current.yaw += body_yaw_rate * interval_seconds;

        *current
    }
}
