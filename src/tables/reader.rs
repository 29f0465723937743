//! CSV adapters for the station registry and the raw observation table.

use crate::observations::series::{ObservationSet, RawObservation};
use crate::tables::error::TableError;
use crate::types::station::Station;
use log::{info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

pub const STATION_COLUMN: &str = "station";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const TIME_COLUMN: &str = "time";
pub const VISIBILITY_COLUMN: &str = "visibility";

/// Reads every column as text. Numeric columns are cast explicitly afterwards, so
/// zero-padded station ids such as `08001099999` keep their leading zeros.
fn read_csv(path: &Path) -> Result<DataFrame, TableError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))
}

/// Fetches `name` cast to `dtype`.
fn typed_column(
    df: &DataFrame,
    path: &Path,
    name: &'static str,
    dtype: &DataType,
) -> Result<Column, TableError> {
    df.column(name)
        .and_then(|column| column.cast(dtype))
        .map_err(|source| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: name,
            source,
        })
}

fn missing_column<'a>(
    path: &'a Path,
    column: &'static str,
) -> impl Fn(PolarsError) -> TableError + 'a {
    move |source| TableError::MissingColumn {
        path: path.to_path_buf(),
        column,
        source,
    }
}

/// Reads the station registry (`station`, `latitude`, `longitude`).
///
/// Rows without a name or with non-finite coordinates are skipped. When a name occurs
/// more than once, the first row wins.
pub fn read_station_registry(path: &Path) -> Result<Vec<Station>, TableError> {
    let df = read_csv(path)?;
    let names = typed_column(&df, path, STATION_COLUMN, &DataType::String)?;
    let latitudes = typed_column(&df, path, LATITUDE_COLUMN, &DataType::Float64)?;
    let longitudes = typed_column(&df, path, LONGITUDE_COLUMN, &DataType::Float64)?;

    let names = names.str().map_err(missing_column(path, STATION_COLUMN))?;
    let latitudes = latitudes.f64().map_err(missing_column(path, LATITUDE_COLUMN))?;
    let longitudes = longitudes.f64().map_err(missing_column(path, LONGITUDE_COLUMN))?;

    let mut seen = HashSet::new();
    let mut stations = Vec::with_capacity(df.height());
    for ((name, lat), lon) in names.into_iter().zip(latitudes).zip(longitudes) {
        match (name, lat, lon) {
            (Some(name), Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                if seen.insert(name.to_string()) {
                    stations.push(Station::new(name, lat, lon));
                } else {
                    warn!("Duplicate station '{}' in {:?}, keeping the first row", name, path);
                }
            }
            _ => warn!("Skipping registry row with missing name or coordinates in {:?}", path),
        }
    }
    info!("Loaded {} stations from {:?}", stations.len(), path);
    Ok(stations)
}

/// Reads the raw observation table (`station`, `time`, `visibility`) and decodes it into
/// per-station series. Visibilities are clamped to `visibility_cap_m`.
pub fn read_observations(path: &Path, visibility_cap_m: f64) -> Result<ObservationSet, TableError> {
    let df = read_csv(path)?;
    let stations = typed_column(&df, path, STATION_COLUMN, &DataType::String)?;
    let times = typed_column(&df, path, TIME_COLUMN, &DataType::String)?;
    let visibilities = typed_column(&df, path, VISIBILITY_COLUMN, &DataType::String)?;

    let stations = stations.str().map_err(missing_column(path, STATION_COLUMN))?;
    let times = times.str().map_err(missing_column(path, TIME_COLUMN))?;
    let visibilities = visibilities
        .str()
        .map_err(missing_column(path, VISIBILITY_COLUMN))?;

    let rows: Vec<RawObservation> = stations
        .into_iter()
        .zip(times)
        .zip(visibilities)
        .filter_map(|((station, time), visibility)| {
            Some(RawObservation {
                station: station?.to_string(),
                time: time.map(str::to_string),
                visibility: visibility.map(str::to_string),
            })
        })
        .collect();
    info!("Read {} observation rows from {:?}", rows.len(), path);
    Ok(ObservationSet::from_raw(rows, visibility_cap_m))
}
