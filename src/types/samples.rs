//! Row types flowing through the verification pipeline, from per-timestep predictions
//! down to the classified time bins.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Station-level predicted liquid water content for one grid timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSample {
    pub station: String,
    pub time: DateTime<Utc>,
    /// Predicted LWC in g/m³. `None` when the inputs for this timestep could not be
    /// imputed; such rows are dropped before alignment.
    pub predicted_lwc: Option<f64>,
}

/// One visibility reading from a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSample {
    pub station: String,
    pub time: DateTime<Utc>,
    /// Visibility in meters, already clamped to the configured display cap.
    pub visibility_m: f64,
}

/// A prediction joined with the nearest observation within tolerance.
///
/// `time` is the prediction's timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    pub station: String,
    pub time: DateTime<Utc>,
    pub predicted_lwc: f64,
    pub visibility_m: f64,
}

/// Mean values over one fixed-width time window of aligned pairs, with the derived
/// fog labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub station: String,
    pub bin_start: DateTime<Utc>,
    /// Display timestamp only, never used for joins.
    pub bin_mid: DateTime<Utc>,
    pub mean_predicted_lwc: f64,
    pub mean_visibility_m: f64,
    /// Number of aligned pairs averaged into this bin (always > 0).
    pub pair_count: usize,
    pub obs_fog: bool,
    pub pred_fog: bool,
}
