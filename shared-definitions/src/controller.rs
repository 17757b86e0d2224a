use serde::{Deserialize, Serialize};

/// Gains of a single PID loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct PIDTuneConfig {
    pub proportional_multiplier: f64,
    pub integral_multiplier: f64,
    pub derivative_multiplier: f64,
}

impl PIDTuneConfig {
    pub const fn new(
        proportional_multiplier: f64,
        integral_multiplier: f64,
        derivative_multiplier: f64,
    ) -> Self {
        Self {
            proportional_multiplier,
            integral_multiplier,
            derivative_multiplier,
        }
    }
}

/// Gains for every loop of the flight cascade.
///
/// Velocity loops are in the body frame, `horizontal_velocity` is shared by
/// the x and y axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct PIDTuneInput {
    pub vertical_velocity: PIDTuneConfig,
    pub horizontal_velocity: PIDTuneConfig,
    pub pitch_rate: PIDTuneConfig,
    pub roll_rate: PIDTuneConfig,
    pub yaw_angle: PIDTuneConfig,
    pub yaw_rate: PIDTuneConfig,
}
