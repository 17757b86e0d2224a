use embedded_hal::pwm::SetDutyCycle;

use crate::{
    config::{constants::CALIBRATION_ITERATIONS, store::CalibrationStore, FlightConfig, RunMode},
    control::thermal::ThermalRegulator,
    drivers::imu_sensors::InertialSensor,
    inertial_measurement::CalibratedSensor,
    output::{motors_state_manager::QuadcopterMotorsStateManager, video::VideoRecorder},
    shared_core_values::CancellationToken,
    util::{
        error::{FlightError, FlightResult},
        time::Clock,
    },
};

/// Loop counters reported at shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LoopStatistics {
    pub loop_count: u64,
    pub elapsed: f64,
}

impl LoopStatistics {
    pub fn loops_per_second(&self) -> Option<f64> {
        if self.elapsed > 0.0 {
            Some(self.loop_count as f64 / self.elapsed)
        } else {
            None
        }
    }
}

/// Everything one run owns: sensor, actuators and settings.
pub struct AppContext<S, C, M, H>
where
    S: InertialSensor,
    C: Clock,
    M: SetDutyCycle,
    H: SetDutyCycle,
{
    pub(crate) config: FlightConfig,
    pub(crate) sensor: CalibratedSensor<S, C>,
    pub(crate) motors: QuadcopterMotorsStateManager<M>,
    pub(crate) thermal: ThermalRegulator<H>,
    pub(crate) cancellation: CancellationToken,
    pub(crate) video: Option<VideoRecorder>,
    pub(crate) stats: LoopStatistics,
}

impl<S, C, M, H> AppContext<S, C, M, H>
where
    S: InertialSensor,
    C: Clock,
    M: SetDutyCycle,
    H: SetDutyCycle,
{
    pub fn new(
        config: FlightConfig,
        sensor: CalibratedSensor<S, C>,
        motors: QuadcopterMotorsStateManager<M>,
        thermal: ThermalRegulator<H>,
        cancellation: CancellationToken,
    ) -> Self {
        AppContext {
            config,
            sensor,
            motors,
            thermal,
            cancellation,
            video: None,
            stats: LoopStatistics::default(),
        }
    }

    pub fn stats(&self) -> LoopStatistics {
        self.stats
    }

    /// Warm up, calibrate, then do whatever the run mode asks for. Always
    /// follow with [`Self::shutdown`], whatever this returns.
    pub fn run(&mut self) -> FlightResult<()> {
        log::error!("{:?}: {:?}", self.config.airframe, self.config.mode);
        let first = self.sensor.next_sample();
        self.thermal.preflight_check(first.temperature())?;
        self.thermal.warm_up(&mut self.sensor, &self.cancellation)?;

        if self.config.mode == RunMode::CalibrateGravity {
            return self.run_gravity_calibration();
        }

        log::error!("Calibrating gyros, keep still");
        let thermal = &mut self.thermal;
        self.sensor
            .calibrate_gyro_bias(CALIBRATION_ITERATIONS, |sample| {
                thermal
                    .regulate(sample.temperature(), sample.timestamp)
                    .map(|_| ())
            })?;
        self.check_cancelled()?;

        let takeoff = self.measure_takeoff_attitude()?;

        if self.config.video {
            self.video = Some(VideoRecorder::start(&self.config.video_dir)?);
        }

        match self.config.mode {
            RunMode::BladeTest => self.run_blade_test(),
            _ => self.run_flight(&takeoff),
        }
    }

    fn run_gravity_calibration(&mut self) -> FlightResult<()> {
        log::error!("Measuring gravity offsets, keep still");
        let thermal = &mut self.thermal;
        let calibration = self
            .sensor
            .calibrate_gravity(CALIBRATION_ITERATIONS, |sample| {
                thermal
                    .regulate(sample.temperature(), sample.timestamp)
                    .map(|_| ())
            })?;
        log::error!(
            "Gravity at {:.2}oC: {:?}",
            calibration.temperature_c,
            calibration.gravity
        );
        CalibrationStore::new(&self.config.offsets_file).append(&calibration)
    }

    pub(crate) fn check_cancelled(&self) -> FlightResult<()> {
        if self.cancellation.is_cancelled() {
            log::error!("Aborted by operator");
            return Err(FlightError::Aborted);
        }
        Ok(())
    }

    /// Motors and heater off, video stopped, statistics logged. Every step
    /// runs even if an earlier one fails; the first failure is returned.
    pub fn shutdown(&mut self) -> FlightResult<()> {
        let mut first_error = None;

        if let Err(error) = self.motors.kill_motors() {
            log::error!("Could not stop motors: {}", error);
            first_error.get_or_insert(error);
        }
        if let Err(error) = self.thermal.heater_off() {
            log::error!("Could not stop heater: {}", error);
            first_error.get_or_insert(error);
        }
        if let Some(video) = self.video.take() {
            log::error!("Video saved to {}", video.output().display());
            if let Err(error) = video.stop() {
                log::error!("Could not stop video: {}", error);
                first_error.get_or_insert(error);
            }
        }

        let misses = self.sensor.misses();
        log::error!(
            "{} data-ready misses, {} bus misses",
            misses.data_ready,
            misses.bus
        );
        let excursions = self.thermal.excursions_reported();
        if excursions > 0 {
            log::error!("{} temperature excursion warnings in flight", excursions);
        }
        if let Some(speed) = self.stats.loops_per_second() {
            log::error!(
                "loop speed {:.3} loops per second over {:.3}s",
                speed,
                self.stats.elapsed
            );
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
