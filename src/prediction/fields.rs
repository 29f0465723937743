//! In-memory meteorological fields of one grid source file.
//!
//! Decoding the source file is left to a [`crate::GridLoader`]; this type only fixes the
//! shape contract the prediction stage relies on.

use crate::prediction::error::PredictionError;
use crate::types::grid::GridGeometry;
use bon::bon;
use chrono::{DateTime, Utc};

/// Gridded model fields for every timestep of one month.
///
/// Every field is stored time-major and flattened: the value of timestep `t` at cell
/// `c` lives at `t * cells + c`, where `cells` is `geometry.len()`. Missing values are
/// `NaN`.
#[derive(Debug, Clone)]
pub struct GridFields {
    geometry: GridGeometry,
    times: Vec<DateTime<Utc>>,
    relative_humidity: Vec<f64>,
    specific_humidity: Vec<f64>,
    u_wind: Vec<f64>,
    v_wind: Vec<f64>,
    w_wind: Vec<f64>,
}

#[bon]
impl GridFields {
    /// Creates the field set, checking that every field has `times.len() * geometry.len()`
    /// values.
    #[builder]
    pub fn new(
        geometry: GridGeometry,
        times: Vec<DateTime<Utc>>,
        relative_humidity: Vec<f64>,
        specific_humidity: Vec<f64>,
        u_wind: Vec<f64>,
        v_wind: Vec<f64>,
        w_wind: Vec<f64>,
    ) -> Result<Self, PredictionError> {
        let cells = geometry.len();
        let expected = times.len() * cells;
        for (field, values) in [
            ("relative_humidity", &relative_humidity),
            ("specific_humidity", &specific_humidity),
            ("u_wind", &u_wind),
            ("v_wind", &v_wind),
            ("w_wind", &w_wind),
        ] {
            if values.len() != expected {
                return Err(PredictionError::FieldShape {
                    field,
                    times: times.len(),
                    cells,
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(Self {
            geometry,
            times,
            relative_humidity,
            specific_humidity,
            u_wind,
            v_wind,
            w_wind,
        })
    }
}

impl GridFields {
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Raw `(rh, q, u, v, w)` values of one cell at one timestep.
    pub(crate) fn cell_values(
        &self,
        time_index: usize,
        cell: usize,
    ) -> Result<[f64; 5], PredictionError> {
        let cells = self.geometry.len();
        if cell >= cells {
            return Err(PredictionError::CellOutOfRange { cell, cells });
        }
        let i = time_index * cells + cell;
        Ok([
            self.relative_humidity[i],
            self.specific_humidity[i],
            self.u_wind[i],
            self.v_wind[i],
            self.w_wind[i],
        ])
    }
}
