pub mod app_context;
#[cfg(feature = "raspberry-pi")]
pub mod board;
pub mod config;
pub mod control;
pub mod drivers;
pub mod inertial_measurement;
pub mod output;
pub mod shared_core_values;
pub mod telemetry;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
