use shared_definitions::controller::PIDTuneInput;

use crate::{
    config::constants::GRAV_ACCEL,
    inertial_measurement::CorrectedSample,
    output::vehicle_movement_mappers::MixerCommand,
    util::math::{
        frames::{body_rate_to_euler_rate, earth_to_body, euler_from_gravity, GravityAngles},
        vectors::Vector3D,
    },
};

use super::{
    complementary_filter::{AttitudeEstimator, Orientation},
    pid::{PIDOutput, PID},
};

/// Attitude and gravity measured on the ground just before takeoff.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TakeoffAttitude {
    pub orientation: Orientation,
    /// Gravity as the sensor saw it, in g.
    pub body_gravity: Vector3D,
    /// The same vector rotated into the earth frame.
    pub earth_gravity: Vector3D,
}

pub struct CascadeInput {
    /// Time averaged, corrected readings over the last integration period.
    pub sample: CorrectedSample,
    pub integration_period: f64,
    /// Earth frame velocity target, m/s.
    pub velocity_target: Vector3D,
    pub hover_speed: i32,
    pub now: f64,
}

/// Every intermediate of one cascade update, for the diagnostics log.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CascadeState {
    pub gravity_angles: GravityAngles,
    pub orientation: Orientation,
    pub body_gravity: Vector3D,
    pub velocity: Vector3D,
    pub velocity_target: Vector3D,
    pub velocity_x: PIDOutput,
    pub velocity_y: PIDOutput,
    pub velocity_z: PIDOutput,
    pub pitch_rate_target: f64,
    pub roll_rate_target: f64,
    pub yaw_rate_target: f64,
    pub yaw_angle: PIDOutput,
    pub pitch_rate: PIDOutput,
    pub roll_rate: PIDOutput,
    pub yaw_rate: PIDOutput,
    pub command: MixerCommand,
}

/// Velocity → yaw angle → rotation rate → mixer command.
///
/// The body frame velocity estimate is an open integral of acceleration
/// minus gravity and is never re-zeroed; neither is yaw. Both drift over a
/// long flight.
pub struct ControlCascade {
    estimator: AttitudeEstimator,
    earth_gravity: Vector3D,
    velocity: Vector3D,
    velocity_x_pid: PID,
    velocity_y_pid: PID,
    velocity_z_pid: PID,
    yaw_angle_pid: PID,
    pitch_rate_pid: PID,
    roll_rate_pid: PID,
    yaw_rate_pid: PID,
}

impl ControlCascade {
    pub fn new(gains: &PIDTuneInput, tau: f64, takeoff: &TakeoffAttitude, now: f64) -> Self {
        ControlCascade {
            estimator: AttitudeEstimator::new(tau, takeoff.orientation),
            earth_gravity: takeoff.earth_gravity,
            velocity: Vector3D::default(),
            velocity_x_pid: PID::from_config(&gains.horizontal_velocity, now),
            velocity_y_pid: PID::from_config(&gains.horizontal_velocity, now),
            velocity_z_pid: PID::from_config(&gains.vertical_velocity, now),
            yaw_angle_pid: PID::from_config(&gains.yaw_angle, now),
            pitch_rate_pid: PID::from_config(&gains.pitch_rate, now),
            roll_rate_pid: PID::from_config(&gains.roll_rate, now),
            yaw_rate_pid: PID::from_config(&gains.yaw_rate, now),
        }
    }

    pub fn velocity(&self) -> Vector3D {
        self.velocity
    }

    pub fn update(&mut self, input: &CascadeInput) -> CascadeState {
        let accel = input.sample.accel;
        let gyro = input.sample.gyro;
        let dt = input.integration_period;
        let now = input.now;

        let gravity_angles = euler_from_gravity(&accel);
        let previous = self.estimator.orientation();
        let euler_rates = body_rate_to_euler_rate(&gyro, previous.pitch, previous.roll);
        let orientation = self
            .estimator
            .update(&euler_rates, gyro.z, &gravity_angles, dt);

        let velocity_target = earth_to_body(
            &input.velocity_target,
            orientation.pitch,
            orientation.roll,
            orientation.yaw,
        );
        let body_gravity = earth_to_body(
            &self.earth_gravity,
            orientation.pitch,
            orientation.roll,
            orientation.yaw,
        );
        self.velocity += (accel - body_gravity) * (dt * GRAV_ACCEL);

        let velocity_x = self
            .velocity_x_pid
            .update(self.velocity.x, velocity_target.x, now);
        let velocity_y = self
            .velocity_y_pid
            .update(self.velocity.y, velocity_target.y, now);
        let velocity_z = self
            .velocity_z_pid
            .update(self.velocity.z, velocity_target.z, now);

        // Forward velocity needs nose-down pitch, rightward needs negative roll.
        let pitch_rate_target = velocity_x.sum();
        let roll_rate_target = -velocity_y.sum();
        let thrust = (input.hover_speed as i64).saturating_add(velocity_z.sum().round() as i64);

        let yaw_angle = self.yaw_angle_pid.update(orientation.yaw, 0.0, now);
        let yaw_rate_target = yaw_angle.sum();

        let pitch_rate = self.pitch_rate_pid.update(gyro.y, pitch_rate_target, now);
        let roll_rate = self.roll_rate_pid.update(gyro.x, roll_rate_target, now);
        let yaw_rate = self.yaw_rate_pid.update(gyro.z, yaw_rate_target, now);

        let command = MixerCommand {
            thrust,
            pitch_rate: (pitch_rate.sum() / 2.0).round() as i64,
            roll_rate: (roll_rate.sum() / 2.0).round() as i64,
            yaw_rate: (yaw_rate.sum() / 2.0).round() as i64,
        };

        CascadeState {
            gravity_angles,
            orientation,
            body_gravity,
            velocity: self.velocity,
            velocity_target,
            velocity_x,
            velocity_y,
            velocity_z,
            pitch_rate_target,
            roll_rate_target,
            yaw_rate_target,
            yaw_angle,
            pitch_rate,
            roll_rate,
            yaw_rate,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use shared_definitions::controller::PIDTuneConfig;

    use super::*;

    fn gains() -> PIDTuneInput {
        PIDTuneInput {
            vertical_velocity: PIDTuneConfig::new(300.0, 60.0, 0.0),
            horizontal_velocity: PIDTuneConfig::new(0.6, 0.1, 0.005),
            pitch_rate: PIDTuneConfig::new(90.0, 0.0, 0.0),
            roll_rate: PIDTuneConfig::new(80.0, 0.0, 0.0),
            yaw_angle: PIDTuneConfig::new(6.0, 3.0, 1.0),
            yaw_rate: PIDTuneConfig::new(40.0, 0.0, 0.0),
        }
    }

    fn level_takeoff() -> TakeoffAttitude {
        TakeoffAttitude {
            orientation: Orientation::default(),
            body_gravity: Vector3D::new(0.0, 0.0, 1.0),
            earth_gravity: Vector3D::new(0.0, 0.0, 1.0),
        }
    }

    fn still_input(velocity_target: Vector3D, now: f64) -> CascadeInput {
        CascadeInput {
            sample: CorrectedSample {
                accel: Vector3D::new(0.0, 0.0, 1.0),
                gyro: Vector3D::default(),
            },
            integration_period: 0.023,
            velocity_target,
            hover_speed: 600,
            now,
        }
    }

    #[test]
    fn stationary_and_untargeted_holds_hover_thrust() {
        let mut cascade = ControlCascade::new(&gains(), 0.5, &level_takeoff(), 0.0);

        let state = cascade.update(&still_input(Vector3D::default(), 0.023));

        assert_eq!(
            state.command,
            MixerCommand {
                thrust: 600,
                pitch_rate: 0,
                roll_rate: 0,
                yaw_rate: 0
            }
        );
        assert_abs_diff_eq!(state.velocity.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn climb_target_adds_thrust() {
        let mut cascade = ControlCascade::new(&gains(), 0.5, &level_takeoff(), 0.0);

        let state = cascade.update(&still_input(Vector3D::new(0.0, 0.0, 0.5), 0.023));

        // P alone is 150; I adds 60 * 0.5 * 0.023
        assert_eq!(state.command.thrust, 600 + 151);
        assert_eq!(state.command.pitch_rate, 0);
    }

    #[test]
    fn forward_target_pitches_and_sideways_target_rolls_opposite() {
        let mut cascade = ControlCascade::new(&gains(), 0.5, &level_takeoff(), 0.0);

        let state = cascade.update(&still_input(Vector3D::new(1.0, 1.0, 0.0), 0.023));

        assert!(state.pitch_rate_target > 0.0);
        assert_abs_diff_eq!(state.roll_rate_target, -state.pitch_rate_target, epsilon = 1e-12);
        assert!(state.command.pitch_rate > 0);
        assert!(state.command.roll_rate < 0);
    }

    #[test]
    fn vertical_acceleration_integrates_into_velocity() {
        let mut cascade = ControlCascade::new(&gains(), 0.5, &level_takeoff(), 0.0);
        let mut input = still_input(Vector3D::default(), 0.1);
        input.sample.accel = Vector3D::new(0.0, 0.0, 1.1);
        input.integration_period = 0.1;

        cascade.update(&input);

        assert_abs_diff_eq!(cascade.velocity().z, 0.1 * 0.1 * GRAV_ACCEL, epsilon = 1e-9);
    }

    #[test]
    fn yaw_drift_is_opposed_through_the_rate_loop() {
        let mut cascade = ControlCascade::new(&gains(), 0.5, &level_takeoff(), 0.0);
        let mut input = still_input(Vector3D::default(), 0.1);
        input.sample.gyro = Vector3D::new(0.0, 0.0, 0.2);
        input.integration_period = 0.1;

        let state = cascade.update(&input);

        assert_abs_diff_eq!(state.orientation.yaw, 0.02, epsilon = 1e-12);
        assert!(state.yaw_rate_target < 0.0);
        assert!(state.command.yaw_rate < 0);
    }
}
