use embedded_hal::pwm::SetDutyCycle;

use crate::{
    app_context::AppContext,
    config::constants::{
        BLADE_TEST_HOLD_SECONDS, BLADE_TEST_STEP, BLADE_TEST_STEP_SECONDS, TAKEOFF_GRAVITY_SAMPLES,
    },
    drivers::imu_sensors::InertialSensor,
    telemetry::{log_diagnostics, log_diagnostics_header, DiagnosticsRow},
    util::{
        error::FlightResult,
        math::{
            frames::{body_to_earth, euler_from_gravity},
            vectors::Vector3D,
        },
        time::Clock,
    },
};

use super::{
    complementary_filter::Orientation,
    flight_controllers::{CascadeInput, ControlCascade, TakeoffAttitude},
    flight_plan::{FlightPlan, PlanProgress, RampState, TakeoffRamp},
    integrator::IntegrationAccumulator,
};

impl<S, C, M, H> AppContext<S, C, M, H>
where
    S: InertialSensor,
    C: Clock,
    M: SetDutyCycle,
    H: SetDutyCycle,
{
    /// Time-averages gravity over a short still period and derives the
    /// starting pitch and roll from it. Yaw starts at zero.
    pub(crate) fn measure_takeoff_attitude(&mut self) -> FlightResult<TakeoffAttitude> {
        let mut accumulator = IntegrationAccumulator::new();
        let mut last_sample_time = self.sensor.clock().now();
        for _ in 0..TAKEOFF_GRAVITY_SAMPLES {
            let sample = self.sensor.next_sample();
            self.thermal
                .regulate(sample.temperature(), sample.timestamp)?;
            accumulator.add_sample(
                sample.reading.accel.to_vector(),
                sample.reading.gyro.to_vector(),
                sample.timestamp - last_sample_time,
            );
            last_sample_time = sample.timestamp;
        }

        let (accel, gyro) = accumulator.average();
        let corrected = self.sensor.correct(&accel, &gyro);
        let angles = euler_from_gravity(&corrected.accel);
        let earth_gravity = body_to_earth(&corrected.accel, angles.pitch, angles.roll, 0.0);
        log::error!(
            "Takeoff pitch {:.3}, roll {:.3}, gravity {:?}",
            angles.pitch.to_degrees(),
            angles.roll.to_degrees(),
            earth_gravity
        );

        Ok(TakeoffAttitude {
            orientation: Orientation {
                pitch: angles.pitch,
                roll: angles.roll,
                yaw: 0.0,
            },
            body_gravity: corrected.accel,
            earth_gravity,
        })
    }

    /// Spins each motor up to the hover target on its own, holds it, and
    /// stops it. Props on, feet on the ground.
    pub(crate) fn run_blade_test(&mut self) -> FlightResult<()> {
        let clock = self.sensor.clock();
        for index in 0..4 {
            self.check_cancelled()?;
            log::error!("Testing motor {:?}", self.motors.motor_location(index));
            for count in (0..self.config.hover_target as i64).step_by(BLADE_TEST_STEP as usize) {
                self.motors.set_single_motor_power(index, count)?;
                clock.sleep(BLADE_TEST_STEP_SECONDS);
            }
            clock.sleep(BLADE_TEST_HOLD_SECONDS);
            self.motors.set_single_motor_power(index, 0)?;
        }
        Ok(())
    }

    /// The flight loop. Every sensor sample is accumulated and drives the
    /// heater; every motion period the accumulated readings drive the
    /// control cascade and the motors. Returns once the plan is flown.
    pub(crate) fn run_flight(&mut self, takeoff: &TakeoffAttitude) -> FlightResult<()> {
        let motion_period = self.config.motion_period();
        let start_time = self.sensor.clock().now();

        let mut cascade = ControlCascade::new(&self.config.gains, self.config.tau, takeoff, start_time);
        let mut ramp = TakeoffRamp::new(
            self.config.hover_target,
            motion_period,
            self.config.rtf_period,
        );
        let mut plan: Option<FlightPlan> = None;
        let mut accumulator = IntegrationAccumulator::new();
        let mut velocity_target = Vector3D::default();

        let mut last_sample_time = start_time;
        let mut last_motion_update = start_time;
        let mut integration_start = start_time;

        if self.config.diagnostics {
            log_diagnostics_header();
        }
        log::error!("Thunderbirds are go!");

        loop {
            self.check_cancelled()?;

            let sample = self.sensor.next_sample();
            let now = sample.timestamp;
            self.stats.loop_count += 1;
            self.stats.elapsed = now - start_time;

            let temperature = sample.temperature();
            let thermal = self.thermal.regulate_in_flight(temperature, now)?;

            accumulator.add_sample(
                sample.reading.accel.to_vector(),
                sample.reading.gyro.to_vector(),
                now - last_sample_time,
            );
            last_sample_time = now;

            if now - last_motion_update < motion_period {
                continue;
            }
            last_motion_update += motion_period;

            let integration_period = now - integration_start;
            integration_start = now;
            let (accel, gyro) = accumulator.average();
            accumulator.reset();
            let corrected = self.sensor.correct(&accel, &gyro);

            let mut complete = false;
            let hover_speed = match plan.as_mut() {
                None => match ramp.advance() {
                    RampState::Ramping(speed) => speed,
                    RampState::Ready(speed) => {
                        let ready = FlightPlan::new(self.config.flight_plan.clone(), now);
                        log::error!(
                            "Ready to fly at {}, plan lasts {:.1}s",
                            speed,
                            ready.total_duration()
                        );
                        plan = Some(ready);
                        speed
                    }
                },
                Some(plan) => {
                    match plan.get_targets(now) {
                        PlanProgress::InProgress(target) => velocity_target = target,
                        PlanProgress::Complete(target) => {
                            velocity_target = target;
                            complete = true;
                        }
                    }
                    ramp.hover_speed()
                }
            };

            let state = cascade.update(&CascadeInput {
                sample: corrected,
                integration_period,
                velocity_target,
                hover_speed,
                now,
            });
            let pulse_widths = self.motors.apply(&state.command)?;

            if self.config.diagnostics {
                log_diagnostics(&DiagnosticsRow {
                    elapsed: self.stats.elapsed,
                    integration_period,
                    loop_count: self.stats.loop_count,
                    temperature,
                    thermal,
                    sample: &corrected,
                    earth_gravity: takeoff.earth_gravity,
                    earth_velocity_target: velocity_target,
                    cascade: &state,
                    pulse_widths,
                });
            }

            if complete {
                log::error!("Flight plan complete");
                return Ok(());
            }
        }
    }
}
