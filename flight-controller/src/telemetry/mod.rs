pub mod logger;

use std::fmt::{self, Display, Formatter};

use crate::{
    control::{flight_controllers::CascadeState, pid::PIDOutput},
    inertial_measurement::{calibrated_sensor::temperature_celsius, CorrectedSample},
    util::math::vectors::Vector3D,
};

pub const DIAGNOSTICS_TARGET: &str = "diagnostics";

pub const DIAGNOSTICS_HEADER: &str = "time, dt, loop, temp, temp_raw, tpp, tpi, tpd, \
qgx, qgy, qgz, qax, qay, qaz, efrgv_x, efrgv_y, efrgv_z, qfrgv_x, qfrgv_y, qfrgv_z, \
qvx_input, qvy_input, qvz_input, epa, era, eta, pa, ra, ya, \
evx_target, qvx_target, qxp, qxi, qxd, pr_target, prp, pri, prd, pr_out, \
evy_target, qvy_target, qyp, qyi, qyd, rr_target, rrp, rri, rrd, rr_out, \
evz_target, qvz_target, qzp, qzi, qzd, qvz_out, yr_target, yrp, yri, yrd, yr_out, \
FL spin, FR spin, BL spin, BR spin";

/// One motion update, written as a CSV line. Angles in degrees.
pub struct DiagnosticsRow<'a> {
    pub elapsed: f64,
    pub integration_period: f64,
    pub loop_count: u64,
    pub temperature: i16,
    pub thermal: PIDOutput,
    pub sample: &'a CorrectedSample,
    pub earth_gravity: Vector3D,
    pub earth_velocity_target: Vector3D,
    pub cascade: &'a CascadeState,
    pub pulse_widths: [u16; 4],
}

fn write_pid(f: &mut Formatter<'_>, output: &PIDOutput) -> fmt::Result {
    write!(
        f,
        "{:.6}, {:.6}, {:.6}",
        output.proportional, output.integral, output.derivative
    )
}

fn write_vector(f: &mut Formatter<'_>, vector: &Vector3D) -> fmt::Result {
    write!(f, "{:.6}, {:.6}, {:.6}", vector.x, vector.y, vector.z)
}

impl Display for DiagnosticsRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let cascade = self.cascade;
        write!(
            f,
            "{:.6}, {:.6}, {}, {:.6}, {}, ",
            self.elapsed,
            self.integration_period,
            self.loop_count,
            temperature_celsius(self.temperature),
            self.temperature
        )?;
        write_pid(f, &self.thermal)?;
        f.write_str(", ")?;
        write_vector(f, &self.sample.gyro)?;
        f.write_str(", ")?;
        write_vector(f, &self.sample.accel)?;
        f.write_str(", ")?;
        write_vector(f, &self.earth_gravity)?;
        f.write_str(", ")?;
        write_vector(f, &cascade.body_gravity)?;
        f.write_str(", ")?;
        write_vector(f, &cascade.velocity)?;
        write!(
            f,
            ", {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, ",
            cascade.gravity_angles.pitch.to_degrees(),
            cascade.gravity_angles.roll.to_degrees(),
            cascade.gravity_angles.tilt.to_degrees(),
            cascade.orientation.pitch.to_degrees(),
            cascade.orientation.roll.to_degrees(),
            cascade.orientation.yaw.to_degrees()
        )?;

        write!(
            f,
            "{:.6}, {:.6}, ",
            self.earth_velocity_target.x, cascade.velocity_target.x
        )?;
        write_pid(f, &cascade.velocity_x)?;
        write!(f, ", {:.6}, ", cascade.pitch_rate_target.to_degrees())?;
        write_pid(f, &cascade.pitch_rate)?;
        write!(f, ", {}, ", cascade.command.pitch_rate)?;

        write!(
            f,
            "{:.6}, {:.6}, ",
            self.earth_velocity_target.y, cascade.velocity_target.y
        )?;
        write_pid(f, &cascade.velocity_y)?;
        write!(f, ", {:.6}, ", cascade.roll_rate_target.to_degrees())?;
        write_pid(f, &cascade.roll_rate)?;
        write!(f, ", {}, ", cascade.command.roll_rate)?;

        write!(
            f,
            "{:.6}, {:.6}, ",
            self.earth_velocity_target.z, cascade.velocity_target.z
        )?;
        write_pid(f, &cascade.velocity_z)?;
        write!(
            f,
            ", {:.6}, {:.6}, ",
            cascade.velocity_z.sum(),
            cascade.yaw_rate_target
        )?;
        write_pid(f, &cascade.yaw_rate)?;
        write!(
            f,
            ", {}, {}, {}, {}, {}",
            cascade.command.yaw_rate,
            self.pulse_widths[0],
            self.pulse_widths[1],
            self.pulse_widths[2],
            self.pulse_widths[3]
        )
    }
}

pub fn log_diagnostics_header() {
    log::warn!(target: DIAGNOSTICS_TARGET, "{}", DIAGNOSTICS_HEADER);
}

pub fn log_diagnostics(row: &DiagnosticsRow) {
    log::warn!(target: DIAGNOSTICS_TARGET, "{}", row);
}
