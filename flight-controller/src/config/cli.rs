use std::path::PathBuf;

use clap::Parser;
use shared_definitions::{
    controller::{PIDTuneConfig, PIDTuneInput},
    flight_plan::FlightPlanStep,
};

use crate::{
    control::flight_plan::{default_flight_plan, load_flight_plan, TakeoffRamp},
    drivers::mpu_6050::registers::LowPassFrequencyValues,
    inertial_measurement::CalibrationProfile,
    util::error::ConfigError,
};

use super::constants::{
    Airframe, PinAssignment, CALIBRATION_DLPF, DEFAULT_DLPF, DEFAULT_MOTION_FREQUENCY,
    DEFAULT_RTF_PERIOD, DEFAULT_TAU, OFFSETS_FILE, VIDEO_DIRECTORY, VOLATILE_LOG_FILE,
};

/// Quadcopter flight controller. Select one of -f, -g or --tc.
#[derive(Parser, Debug, Clone)]
#[command(name = "quad-flight", version, disable_help_flag = true)]
pub struct CliArgs {
    /// Fly the flight plan
    #[arg(short = 'f')]
    pub fly: bool,

    /// Calibrate gravity against temperature, save and end
    #[arg(short = 'g')]
    pub calibrate_gravity: bool,

    /// Test case to run; 1 spins each blade in turn
    #[arg(long = "tc", default_value_t = 0)]
    pub test_case: u8,

    /// Hover thrust, 0..=1000us above the ESC minimum
    #[arg(short = 'h', allow_negative_numbers = true)]
    pub hover_target: Option<i32>,

    /// Record video of the flight
    #[arg(short = 'v')]
    pub video: bool,

    /// Log a diagnostics row every motion update
    #[arg(short = 'd')]
    pub diagnostics: bool,

    /// Motion processing frequency, Hz
    #[arg(short = 'm')]
    pub motion_frequency: Option<f64>,

    /// Seconds to ramp up to hover thrust before the flight plan starts
    #[arg(short = 'r')]
    pub rtf_period: Option<f64>,

    /// Complementary filter time constant, seconds
    #[arg(short = 't', allow_negative_numbers = true)]
    pub tau: Option<f64>,

    /// Digital low pass filter setting, 0..=6
    #[arg(long)]
    pub dlpf: Option<u8>,

    #[arg(long)]
    pub vvp: Option<f64>,
    #[arg(long)]
    pub vvi: Option<f64>,
    #[arg(long)]
    pub vvd: Option<f64>,
    #[arg(long)]
    pub hvp: Option<f64>,
    #[arg(long)]
    pub hvi: Option<f64>,
    #[arg(long)]
    pub hvd: Option<f64>,
    #[arg(long)]
    pub prp: Option<f64>,
    #[arg(long)]
    pub pri: Option<f64>,
    #[arg(long)]
    pub prd: Option<f64>,
    #[arg(long)]
    pub rrp: Option<f64>,
    #[arg(long)]
    pub rri: Option<f64>,
    #[arg(long)]
    pub rrd: Option<f64>,
    #[arg(long)]
    pub yap: Option<f64>,
    #[arg(long)]
    pub yai: Option<f64>,
    #[arg(long)]
    pub yad: Option<f64>,
    /// Yaw rate gains default to half the roll rate gains
    #[arg(long)]
    pub yrp: Option<f64>,
    #[arg(long)]
    pub yri: Option<f64>,
    #[arg(long)]
    pub yrd: Option<f64>,

    #[arg(long, value_enum, default_value_t = Airframe::Phoebe)]
    pub airframe: Airframe,

    /// TOML file of [[step]] tables replacing the built-in plan
    #[arg(long)]
    pub flight_plan: Option<PathBuf>,

    #[arg(long, default_value = VOLATILE_LOG_FILE)]
    pub log_file: PathBuf,

    /// Where the flight log is moved at shutdown
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    #[arg(long, default_value = OFFSETS_FILE)]
    pub offsets_file: PathBuf,

    #[arg(long, default_value = VIDEO_DIRECTORY)]
    pub video_dir: PathBuf,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Fly,
    CalibrateGravity,
    BladeTest,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct FlightConfig {
    pub mode: RunMode,
    pub airframe: Airframe,
    pub hover_target: i32,
    pub video: bool,
    pub diagnostics: bool,
    pub motion_frequency: f64,
    pub rtf_period: f64,
    pub tau: f64,
    pub dlpf: LowPassFrequencyValues,
    pub gains: PIDTuneInput,
    pub calibration: CalibrationProfile,
    pub pins: PinAssignment,
    pub flight_plan: Vec<FlightPlanStep>,
    pub log_file: PathBuf,
    pub log_dir: PathBuf,
    pub offsets_file: PathBuf,
    pub video_dir: PathBuf,
}

impl FlightConfig {
    pub fn motion_period(&self) -> f64 {
        1.0 / self.motion_frequency
    }
}

fn override_gains(
    defaults: PIDTuneConfig,
    proportional: Option<f64>,
    integral: Option<f64>,
    derivative: Option<f64>,
) -> PIDTuneConfig {
    PIDTuneConfig::new(
        proportional.unwrap_or(defaults.proportional_multiplier),
        integral.unwrap_or(defaults.integral_multiplier),
        derivative.unwrap_or(defaults.derivative_multiplier),
    )
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

impl TryFrom<CliArgs> for FlightConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let selected = [args.fly, args.calibrate_gravity, args.test_case != 0];
        let mode = match selected {
            [false, false, false] => return Err(ConfigError::NoMode),
            [true, false, false] => RunMode::Fly,
            [false, true, false] => RunMode::CalibrateGravity,
            [false, false, true] => RunMode::BladeTest,
            _ => return Err(ConfigError::ConflictingModes),
        };
        if args.test_case > 1 {
            return Err(ConfigError::UnknownTestCase(args.test_case));
        }

        let profile = args.airframe.profile();
        let hover_target = args.hover_target.unwrap_or(profile.hover_target);
        if mode != RunMode::CalibrateGravity && !(0..=1000).contains(&hover_target) {
            return Err(ConfigError::HoverOutOfRange(hover_target));
        }
        if mode == RunMode::BladeTest && args.hover_target.is_none() {
            return Err(ConfigError::BladeTestWithoutHover);
        }

        let motion_frequency = positive(
            "motion frequency",
            args.motion_frequency.unwrap_or(DEFAULT_MOTION_FREQUENCY),
        )?;
        let rtf_period = positive("rtf period", args.rtf_period.unwrap_or(DEFAULT_RTF_PERIOD))?;
        let tau = args.tau.unwrap_or(DEFAULT_TAU);
        if tau < 0.0 || !tau.is_finite() {
            return Err(ConfigError::NegativeTau(tau));
        }

        let dlpf = match mode {
            RunMode::CalibrateGravity => CALIBRATION_DLPF,
            _ => args.dlpf.unwrap_or(DEFAULT_DLPF),
        };
        let dlpf = LowPassFrequencyValues::try_from(dlpf).map_err(ConfigError::DlpfOutOfRange)?;

        if mode == RunMode::Fly
            && hover_target > 0
            && TakeoffRamp::increment(hover_target, 1.0 / motion_frequency, rtf_period) == 0
        {
            return Err(ConfigError::RampTooSlow {
                hover: hover_target,
                rtf_period,
                frequency: motion_frequency,
            });
        }

        let defaults = profile.default_tuning();
        let roll_rate = override_gains(defaults.roll_rate, args.rrp, args.rri, args.rrd);
        let gains = PIDTuneInput {
            vertical_velocity: override_gains(
                defaults.vertical_velocity,
                args.vvp,
                args.vvi,
                args.vvd,
            ),
            horizontal_velocity: override_gains(
                defaults.horizontal_velocity,
                args.hvp,
                args.hvi,
                args.hvd,
            ),
            pitch_rate: override_gains(defaults.pitch_rate, args.prp, args.pri, args.prd),
            roll_rate,
            yaw_angle: override_gains(defaults.yaw_angle, args.yap, args.yai, args.yad),
            yaw_rate: PIDTuneConfig::new(
                args.yrp
                    .unwrap_or(roll_rate.proportional_multiplier / 2.0),
                args.yri.unwrap_or(roll_rate.integral_multiplier / 2.0),
                args.yrd.unwrap_or(roll_rate.derivative_multiplier / 2.0),
            ),
        };

        let flight_plan = match &args.flight_plan {
            Some(path) => load_flight_plan(path).map_err(|error| ConfigError::FlightPlanFile {
                path: path.display().to_string(),
                reason: error.to_string(),
            })?,
            None => default_flight_plan(),
        };

        Ok(FlightConfig {
            mode,
            airframe: args.airframe,
            hover_target,
            video: args.video,
            diagnostics: args.diagnostics,
            motion_frequency,
            rtf_period,
            tau,
            dlpf,
            gains,
            calibration: CalibrationProfile::with_accel(profile.accel_offset, profile.accel_gain),
            pins: profile.pins,
            flight_plan,
            log_file: args.log_file,
            log_dir: args.log_dir,
            offsets_file: args.offsets_file,
            video_dir: args.video_dir,
        })
    }
}
