//! Turns gridded model fields into one predicted liquid water content per station and
//! timestep.

use crate::prediction::error::PredictionError;
use crate::prediction::features::{feature_vector, impute_batch_means, FeatureVector};
use crate::prediction::fields::GridFields;
use crate::prediction::model::CloudWaterModel;
use crate::spatial::station_mapper::StationCells;
use crate::types::samples::PredictionSample;
use log::warn;
use rayon::prelude::*;
use std::sync::Arc;

/// Runs the cloud water model over a station's grid cells and reduces the result to a
/// single station value.
///
/// The aggregator keeps no state between timesteps; the model and the air density are
/// the only things shared between calls.
#[derive(Clone)]
pub struct PredictionAggregator {
    model: Arc<dyn CloudWaterModel>,
    air_density: f64,
}

impl PredictionAggregator {
    pub fn new(model: Arc<dyn CloudWaterModel>, air_density: f64) -> Self {
        Self { model, air_density }
    }

    /// Predicted LWC (g/m³) of one station at one timestep.
    ///
    /// Missing features are imputed from the other cells of the same station at the same
    /// timestep. The per-cell mixing ratios are averaged, clamped at zero and converted
    /// with `lwc = q * air_density * 1000`. A non-finite mean leaves the sample without a
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::AllFeaturesMissing`] if some feature is missing in every
    /// cell, so that no value is ever invented for that timestep.
    pub fn predict_at(
        &self,
        fields: &GridFields,
        time_index: usize,
        cells: &StationCells,
    ) -> Result<PredictionSample, PredictionError> {
        let station = &cells.station.name;
        let time = *fields
            .times()
            .get(time_index)
            .ok_or(PredictionError::TimeOutOfRange {
                index: time_index,
                times: fields.times().len(),
            })?;
        if cells.cells.is_empty() {
            return Err(PredictionError::NoCells(station.clone()));
        }

        let mut batch: Vec<FeatureVector> = cells
            .cells
            .iter()
            .map(|&cell| fields.cell_values(time_index, cell).map(feature_vector))
            .collect::<Result<_, _>>()?;

        impute_batch_means(&mut batch).map_err(|feature| PredictionError::AllFeaturesMissing {
            station: station.clone(),
            time,
            feature,
        })?;

        let outputs = self
            .model
            .predict(&batch)
            .map_err(|source| PredictionError::Model {
                station: station.clone(),
                time,
                source,
            })?;
        if outputs.len() != batch.len() {
            return Err(PredictionError::OutputLength {
                station: station.clone(),
                expected: batch.len(),
                found: outputs.len(),
            });
        }

        let mean_mixing_ratio = outputs.iter().sum::<f64>() / outputs.len() as f64;
        // `f64::max` would turn NaN into 0, so check before clamping.
        let predicted_lwc = if mean_mixing_ratio.is_finite() {
            Some(mean_mixing_ratio.max(0.0) * self.air_density * 1000.0)
        } else {
            warn!(
                "Model returned a non-finite mixing ratio for station {} at {}",
                station, time
            );
            None
        };

        Ok(PredictionSample {
            station: station.clone(),
            time,
            predicted_lwc,
        })
    }

    /// Predictions for every timestep of `fields`, in time order.
    ///
    /// Timesteps whose inputs cannot be imputed yield a sample without a value (and a
    /// warning); any other failure aborts the station.
    pub fn predict_series(
        &self,
        fields: &GridFields,
        cells: &StationCells,
    ) -> Result<Vec<PredictionSample>, PredictionError> {
        (0..fields.times().len())
            .into_par_iter()
            .map(|t| match self.predict_at(fields, t, cells) {
                Err(PredictionError::AllFeaturesMissing {
                    station,
                    time,
                    feature,
                }) => {
                    warn!(
                        "Skipping prediction for station {} at {}: '{}' missing in all {} cells",
                        station,
                        time,
                        feature,
                        cells.cells.len()
                    );
                    Ok(PredictionSample {
                        station,
                        time,
                        predicted_lwc: None,
                    })
                }
                other => other,
            })
            .collect()
    }
}
