pub mod complementary_filter;
pub mod control_loops;
pub mod flight_controllers;
pub mod flight_plan;
pub mod integrator;
pub mod pid;
pub mod thermal;
