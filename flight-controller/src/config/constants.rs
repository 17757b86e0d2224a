use shared_definitions::controller::{PIDTuneConfig, PIDTuneInput};

use crate::util::math::vectors::Vector3D;

// Sensor scaling: ±250°/s gyro and ±2g accelerometer over 16 bits
pub const SCALE_GYRO: f64 = 500.0 * std::f64::consts::PI / (65536.0 * 180.0);
pub const SCALE_ACCEL: f64 = 4.0 / 65536.0;
pub const CALIBRATION_ITERATIONS: usize = 50;
pub const TAKEOFF_GRAVITY_SAMPLES: usize = 50;

pub const GRAV_ACCEL: f64 = 9.80665;

// Die temperature, raw units: °C = raw / 340 + 36.53
pub const TEMPERATURE_SCALE: f64 = 340.0;
pub const TEMPERATURE_OFFSET_C: f64 = 36.53;
pub const TEMPERATURE_SET_POINT: i16 = 1180; // 40°C
pub const WARM_UP_TOLERANCE: i32 = 34; // ~0.1°C
pub const MAX_TEMPERATURE_EXCURSION: i32 = 340; // 1°C
pub const WARM_UP_POLL_SECONDS: f64 = 0.1;
pub const THERMAL_PID: PIDTuneConfig = PIDTuneConfig::new(0.75, 0.01, 0.001);

// PWM outputs, pulse widths in microseconds
pub const PWM_CARRIER_US: u16 = 3000;
pub const ESC_MIN_PULSE_WIDTH: u16 = 1000;
pub const ESC_MAX_PULSE_WIDTH: u16 = 2000;
pub const HEATER_MIN_PULSE_WIDTH: u16 = 0;
pub const HEATER_MAX_PULSE_WIDTH: u16 = 2999;

pub const YAW_ANGLE_PID: PIDTuneConfig = PIDTuneConfig::new(6.0, 3.0, 1.0);

// Blade test
pub const BLADE_TEST_STEP: i64 = 10;
pub const BLADE_TEST_STEP_SECONDS: f64 = 0.01;
pub const BLADE_TEST_HOLD_SECONDS: f64 = 10.0;

// Command line defaults
pub const DEFAULT_DLPF: u8 = 4;
pub const CALIBRATION_DLPF: u8 = 6;
pub const DEFAULT_MOTION_FREQUENCY: f64 = 43.0;
pub const DEFAULT_RTF_PERIOD: f64 = 1.0;
pub const DEFAULT_TAU: f64 = 0.5;

pub const VOLATILE_LOG_FILE: &str = "/dev/shm/qclogs";
pub const OFFSETS_FILE: &str = "./qcoffsets.csv";
pub const VIDEO_DIRECTORY: &str = "/home/pi/Videos";

/// BCM GPIO numbers for one airframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    pub data_ready: u8,
    pub heater: u8,
    pub front_left: u8,
    pub front_right: u8,
    pub back_left: u8,
    pub back_right: u8,
}

/// Everything that differs between the two airframes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirframeProfile {
    pub hover_target: i32,
    pub vertical_velocity: PIDTuneConfig,
    pub horizontal_velocity: PIDTuneConfig,
    pub pitch_rate: PIDTuneConfig,
    pub roll_rate: PIDTuneConfig,
    pub accel_offset: Vector3D,
    pub accel_gain: Vector3D,
    pub pins: PinAssignment,
}

impl AirframeProfile {
    /// Default gains for every loop. Yaw rate runs at half the roll rate
    /// gains.
    pub fn default_tuning(&self) -> PIDTuneInput {
        PIDTuneInput {
            vertical_velocity: self.vertical_velocity,
            horizontal_velocity: self.horizontal_velocity,
            pitch_rate: self.pitch_rate,
            roll_rate: self.roll_rate,
            yaw_angle: YAW_ANGLE_PID,
            yaw_rate: PIDTuneConfig::new(
                self.roll_rate.proportional_multiplier / 2.0,
                self.roll_rate.integral_multiplier / 2.0,
                self.roll_rate.derivative_multiplier / 2.0,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Airframe {
    Phoebe,
    Chloe,
}

impl Airframe {
    pub const fn profile(&self) -> AirframeProfile {
        match self {
            Airframe::Phoebe => AirframeProfile {
                hover_target: 600,
                vertical_velocity: PIDTuneConfig::new(300.0, 60.0, 0.0),
                horizontal_velocity: PIDTuneConfig::new(0.6, 0.1, 0.005),
                pitch_rate: PIDTuneConfig::new(90.0, 0.0, 0.0),
                roll_rate: PIDTuneConfig::new(80.0, 0.0, 0.0),
                accel_offset: Vector3D::new(46.28, 78.58, -87.04),
                accel_gain: Vector3D::new(0.99328514, 0.991557479, 1.00327485),
                pins: PinAssignment {
                    data_ready: 24,
                    heater: 26,
                    front_left: 27,
                    front_right: 17,
                    back_left: 5,
                    back_right: 19,
                },
            },
            Airframe::Chloe => AirframeProfile {
                hover_target: 500,
                vertical_velocity: PIDTuneConfig::new(250.0, 50.0, 0.0),
                horizontal_velocity: PIDTuneConfig::new(0.6, 0.1, 0.005),
                pitch_rate: PIDTuneConfig::new(75.0, 0.0, 0.0),
                roll_rate: PIDTuneConfig::new(60.0, 0.0, 0.0),
                accel_offset: Vector3D::new(-75.64, -335.08, -1181.88),
                accel_gain: Vector3D::new(0.997474655, 1.001905479, 0.986795348),
                pins: PinAssignment {
                    data_ready: 25,
                    heater: 26,
                    front_left: 18,
                    front_right: 17,
                    back_left: 23,
                    back_right: 22,
                },
            },
        }
    }
}
