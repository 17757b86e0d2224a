pub mod frames;
pub mod vectors;
