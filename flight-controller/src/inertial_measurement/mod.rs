pub mod calibrated_sensor;

pub use calibrated_sensor::{
    CalibratedSensor, CalibrationProfile, CorrectedSample, GravityCalibration,
};
