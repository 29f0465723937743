//! Per-station observation series built from raw registry rows.

use crate::observations::visibility::{cap_visibility, parse_visibility_token};
use crate::types::samples::ObservationSample;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use std::collections::HashMap;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a naive timestamp (interpreted as UTC) or an RFC 3339 timestamp.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// One unparsed row of the observation table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub station: String,
    pub time: Option<String>,
    pub visibility: Option<String>,
}

/// Time-sorted visibility observations grouped by station.
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    by_station: HashMap<String, Vec<ObservationSample>>,
}

impl ObservationSet {
    /// Builds the set from raw rows. Rows with an unparsable timestamp or visibility are
    /// dropped; parsed visibilities are clamped to `visibility_cap_m`.
    pub fn from_raw<I>(rows: I, visibility_cap_m: f64) -> Self
    where
        I: IntoIterator<Item = RawObservation>,
    {
        let mut dropped = 0usize;
        let samples: Vec<ObservationSample> = rows
            .into_iter()
            .filter_map(|row| {
                let time = row.time.as_deref().and_then(parse_timestamp);
                let visibility = row.visibility.as_deref().and_then(parse_visibility_token);
                match (time, visibility) {
                    (Some(time), Some(visibility_m)) => Some(ObservationSample {
                        station: row.station,
                        time,
                        visibility_m: cap_visibility(visibility_m, visibility_cap_m),
                    }),
                    _ => {
                        dropped += 1;
                        None
                    }
                }
            })
            .collect();
        if dropped > 0 {
            info!("Dropped {} observation rows with missing time or visibility", dropped);
        }
        Self::from_samples(samples)
    }

    /// Groups already-decoded samples by station and sorts each series by time.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = ObservationSample>,
    {
        let mut by_station: HashMap<String, Vec<ObservationSample>> = HashMap::new();
        for sample in samples {
            by_station
                .entry(sample.station.clone())
                .or_default()
                .push(sample);
        }
        for (station, series) in by_station.iter_mut() {
            series.sort_by_key(|s| s.time);
            debug!("Station {} has {} observations", station, series.len());
        }
        Self { by_station }
    }

    /// Observations of `station`, sorted by time. Empty if the station has none.
    pub fn station(&self, station: &str) -> &[ObservationSample] {
        self.by_station
            .get(station)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stations(&self) -> impl Iterator<Item = &str> {
        self.by_station.keys().map(String::as_str)
    }

    /// Total number of observations over all stations.
    pub fn len(&self) -> usize {
        self.by_station.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
