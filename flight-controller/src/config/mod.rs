pub mod cli;
pub mod constants;
pub mod store;

pub use cli::{CliArgs, FlightConfig, RunMode};
