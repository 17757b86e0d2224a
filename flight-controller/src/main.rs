use std::process::ExitCode;

use clap::Parser;

use quad_flight_controller::{
    config::{CliArgs, FlightConfig},
    shared_core_values::CancellationToken,
    telemetry::logger::FlightLogger,
    util::error::FlightResult,
};

#[cfg(feature = "raspberry-pi")]
fn fly(config: FlightConfig, cancellation: CancellationToken) -> FlightResult<()> {
    quad_flight_controller::board::run(config, cancellation)
}

#[cfg(not(feature = "raspberry-pi"))]
fn fly(_config: FlightConfig, _cancellation: CancellationToken) -> FlightResult<()> {
    Err(quad_flight_controller::util::error::FlightError::Hardware(
        "built without the raspberry-pi feature".to_string(),
    ))
}

fn main() -> ExitCode {
    let config = match FlightConfig::try_from(CliArgs::parse()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::from(2);
        }
    };

    let logger = FlightLogger::init(&config.log_file, config.diagnostics);
    let log_dir = config.log_dir.clone();

    let cancellation = CancellationToken::new();
    let handler_token = cancellation.clone();
    if let Err(error) = ctrlc::set_handler(move || handler_token.cancel()) {
        log::error!("Could not install Ctrl-C handler: {}", error);
    }

    let exit_code = match fly(config, cancellation) {
        Ok(()) => 0,
        Err(error) => {
            log::error!("{}", error);
            error.exit_code()
        }
    };

    match logger.persist(&log_dir) {
        Ok(path) => println!("Log saved to {}", path.display()),
        Err(error) => eprintln!("Could not save log {}: {}", logger.path().display(), error),
    }

    ExitCode::from(exit_code as u8)
}
