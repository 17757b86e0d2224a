//! Conversions between the earth frame (gravity aligned) and the body frame
//! (fixed to the airframe), using 3-2-1 Euler angles.
//!
//! None of these guard the cos(pitch) = 0 singularity; the airframe never
//! gets near vertical in practice.

use libm::{atan2, cos, hypot, sin, tan};
use nalgebra::Matrix3;

use super::vectors::{RotationVector3D, Vector3D};

/// Attitude implied by a gravity reading taken while not accelerating.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GravityAngles {
    pub pitch: f64,
    pub roll: f64,
    /// Angle between the body z axis and vertical.
    pub tilt: f64,
}

pub fn euler_from_gravity(gravity: &Vector3D) -> GravityAngles {
    GravityAngles {
        pitch: atan2(-gravity.x, hypot(gravity.y, gravity.z)),
        roll: atan2(gravity.y, gravity.z),
        tilt: atan2(hypot(gravity.x, gravity.y), gravity.z),
    }
}

/// Body frame gyro rates (x, y, z) to Euler rates, given the current pitch
/// and roll.
pub fn body_rate_to_euler_rate(rates: &Vector3D, pitch: f64, roll: f64) -> RotationVector3D {
    let c_pa = cos(pitch);
    let t_pa = tan(pitch);
    let c_ra = cos(roll);
    let s_ra = sin(roll);

    RotationVector3D {
        roll: rates.x + rates.y * s_ra * t_pa + rates.z * c_ra * t_pa,
        pitch: rates.y * c_ra - rates.z * s_ra,
        yaw: rates.y * s_ra / c_pa + rates.z * c_ra / c_pa,
    }
}

fn earth_to_body_matrix(pitch: f64, roll: f64, yaw: f64) -> Matrix3<f64> {
    let (s_pa, c_pa) = (sin(pitch), cos(pitch));
    let (s_ra, c_ra) = (sin(roll), cos(roll));
    let (s_ya, c_ya) = (sin(yaw), cos(yaw));

    Matrix3::new(
        c_pa * c_ya,
        c_pa * s_ya,
        -s_pa,
        s_ra * s_pa * c_ya - c_ra * s_ya,
        s_ra * s_pa * s_ya + c_ra * c_ya,
        s_ra * c_pa,
        c_ra * s_pa * c_ya + s_ra * s_ya,
        c_ra * s_pa * s_ya - s_ra * c_ya,
        c_pa * c_ra,
    )
}

pub fn earth_to_body(vector: &Vector3D, pitch: f64, roll: f64, yaw: f64) -> Vector3D {
    (earth_to_body_matrix(pitch, roll, yaw) * nalgebra::Vector3::from(*vector)).into()
}

/// Inverse of [`earth_to_body`]; the matrix is a rotation so its transpose is
/// its inverse.
pub fn body_to_earth(vector: &Vector3D, pitch: f64, roll: f64, yaw: f64) -> Vector3D {
    (earth_to_body_matrix(pitch, roll, yaw).transpose() * nalgebra::Vector3::from(*vector)).into()
}
