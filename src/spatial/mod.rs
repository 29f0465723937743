pub mod error;
pub mod grid_index;
pub mod station_mapper;
