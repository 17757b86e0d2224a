use serde::{Deserialize, Serialize};

/// One leg of a scripted flight: hold an earth frame velocity (m/s) for
/// `duration` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlanStep {
    pub name: String,
    #[serde(default)]
    pub velocity_x: f64,
    #[serde(default)]
    pub velocity_y: f64,
    #[serde(default)]
    pub velocity_z: f64,
    pub duration: f64,
}

impl FlightPlanStep {
    pub fn new(name: &str, velocity_x: f64, velocity_y: f64, velocity_z: f64, duration: f64) -> Self {
        Self {
            name: name.to_string(),
            velocity_x,
            velocity_y,
            velocity_z,
            duration,
        }
    }
}

/// On-disk layout of a flight plan: a list of `[[step]]` tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlanDocument {
    #[serde(rename = "step")]
    pub steps: Vec<FlightPlanStep>,
}
