pub mod controller;
pub mod flight_plan;
pub mod motors;
