pub mod grid;
pub mod period;
pub mod samples;
pub mod station;
