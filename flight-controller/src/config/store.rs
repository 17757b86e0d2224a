use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{inertial_measurement::GravityCalibration, util::error::FlightResult};

/// Append-only log of gravity calibrations, one
/// `raw_temp, temp_c, gx, gy, gz` line per run.
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: &Path) -> Self {
        CalibrationStore {
            path: path.to_path_buf(),
        }
    }

    pub fn append(&self, calibration: &GravityCalibration) -> FlightResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|error| {
                log::error!(
                    "Could not open offset config file: {} for writing",
                    self.path.display()
                );
                error
            })?;
        writeln!(
            file,
            "{}, {:.6}, {:.6}, {:.6}, {:.6}",
            calibration.temperature_raw,
            calibration.temperature_c,
            calibration.gravity.x,
            calibration.gravity.y,
            calibration.gravity.z
        )?;
        file.flush()?;
        Ok(())
    }
}
