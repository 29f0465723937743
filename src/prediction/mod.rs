pub mod aggregator;
pub mod error;
pub mod features;
pub mod fields;
pub mod model;
