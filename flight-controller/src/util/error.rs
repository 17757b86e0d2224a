use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightError {
    #[error("sensor configuration failed: CONFIG reads back {actual:#04x}, expected {expected:#04x}")]
    SensorConfiguration { expected: u8, actual: u8 },

    #[error("sensor bus error during bring-up: {0}")]
    SensorBus(String),

    #[error("sensor too hot to fly: {excess} raw units above set point")]
    TooHot { excess: i32 },

    #[error("actuator output failed: {0}")]
    Actuator(String),

    #[error("invalid motor layout: {0}")]
    MotorLayout(String),

    #[error("invalid flight plan: {0}")]
    FlightPlan(String),

    #[error("hardware initialisation failed: {0}")]
    Hardware(String),

    #[error("persistence failed: {0}")]
    Io(#[from] io::Error),

    #[error("aborted by operator")]
    Aborted,
}

impl FlightError {
    /// Process exit code for this failure. Operator aborts are a clean exit.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlightError::Aborted => 0,
            _ => 1,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("select one of -f (fly), -g (calibrate gravity) or --tc (test case)")]
    NoMode,

    #[error("only one of -f, -g or --tc may be selected")]
    ConflictingModes,

    #[error("only test case 1 (blade test) is supported, got {0}")]
    UnknownTestCase(u8),

    #[error("hover target must be in 0..=1000, got {0}")]
    HoverOutOfRange(i32),

    #[error("the blade test needs an explicit -h hover target")]
    BladeTestWithoutHover,

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("tau must not be negative, got {0}")]
    NegativeTau(f64),

    #[error("dlpf must be in 0..=6, got {0}")]
    DlpfOutOfRange(u8),

    #[error("ramp increment rounds to zero: hover {hover} over {rtf_period}s at {frequency}Hz")]
    RampTooSlow { hover: i32, rtf_period: f64, frequency: f64 },

    #[error("could not load flight plan {path}: {reason}")]
    FlightPlanFile { path: String, reason: String },
}

pub type FlightResult<T> = Result<T, FlightError>;
