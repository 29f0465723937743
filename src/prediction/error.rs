use chrono::{DateTime, Utc};
use thiserror::Error;

/// Boxed error returned by a [`crate::CloudWaterModel`] implementation.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Every grid cell of station {station} is missing '{feature}' at {time}, cannot impute")]
    AllFeaturesMissing {
        station: String,
        time: DateTime<Utc>,
        feature: &'static str,
    },

    #[error("Cloud water model failed for station {station} at {time}")]
    Model {
        station: String,
        time: DateTime<Utc>,
        #[source]
        source: ModelError,
    },

    #[error("Cloud water model returned {found} values for {expected} feature vectors (station {station})")]
    OutputLength {
        station: String,
        expected: usize,
        found: usize,
    },

    #[error("Field '{field}' has {found} values, expected {expected} ({times} times x {cells} cells)")]
    FieldShape {
        field: &'static str,
        times: usize,
        cells: usize,
        expected: usize,
        found: usize,
    },

    #[error("Grid cell {cell} is outside a grid of {cells} cells")]
    CellOutOfRange { cell: usize, cells: usize },

    #[error("Timestep {index} is outside a time axis of {times} steps")]
    TimeOutOfRange { index: usize, times: usize },

    #[error("Station {0} maps to no grid cells")]
    NoCells(String),
}
