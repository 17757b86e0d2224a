use std::ops::{Add, AddAssign, Div, Mul, Sub};

use nalgebra::Vector3;

/// A body or earth frame vector: acceleration in g, velocity in m/s, or gyro
/// rates in rad/s about the x, y and z axes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }
}

impl From<Vector3<f64>> for Vector3D {
    fn from(vector: Vector3<f64>) -> Self {
        Vector3D {
            x: vector.x,
            y: vector.y,
            z: vector.z,
        }
    }
}

impl From<Vector3D> for Vector3<f64> {
    fn from(vector: Vector3D) -> Self {
        Vector3::new(vector.x, vector.y, vector.z)
    }
}

impl Add<Vector3D> for Vector3D {
    type Output = Vector3D;

    fn add(self, rhs: Vector3D) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub<Vector3D> for Vector3D {
    type Output = Vector3D;

    fn sub(self, rhs: Vector3D) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl AddAssign<Vector3D> for Vector3D {
    fn add_assign(&mut self, rhs: Vector3D) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Div<f64> for Vector3D {
    type Output = Vector3D;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

/// Euler angles (rad) or Euler angle rates (rad/s).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RotationVector3D {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}
