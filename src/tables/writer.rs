//! Output tables as polars `DataFrame`s, and their CSV sinks.

use crate::scoring::confusion::ConfusionMatrix;
use crate::scoring::hierarchy::{SkillTable, VerificationReport};
use crate::scoring::skill::SkillScores;
use crate::tables::error::TableError;
use crate::types::samples::{AlignedPair, Bin, PredictionSample};
use chrono::{DateTime, Utc};
use log::info;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn predictions_frame(samples: &[PredictionSample]) -> PolarsResult<DataFrame> {
    df!(
        "station" => samples.iter().map(|s| s.station.as_str()).collect::<Vec<_>>(),
        "time_stamp" => samples.iter().map(|s| format_time(&s.time)).collect::<Vec<_>>(),
        "predicted_lwc" => samples.iter().map(|s| s.predicted_lwc).collect::<Vec<_>>(),
    )
}

pub fn pairs_frame(pairs: &[AlignedPair]) -> PolarsResult<DataFrame> {
    df!(
        "station" => pairs.iter().map(|p| p.station.as_str()).collect::<Vec<_>>(),
        "time" => pairs.iter().map(|p| format_time(&p.time)).collect::<Vec<_>>(),
        "predicted_lwc" => pairs.iter().map(|p| p.predicted_lwc).collect::<Vec<_>>(),
        "visibility" => pairs.iter().map(|p| p.visibility_m).collect::<Vec<_>>(),
    )
}

pub fn bins_frame(bins: &[Bin]) -> PolarsResult<DataFrame> {
    df!(
        "station" => bins.iter().map(|b| b.station.as_str()).collect::<Vec<_>>(),
        "bin_start" => bins.iter().map(|b| format_time(&b.bin_start)).collect::<Vec<_>>(),
        "bin_mid" => bins.iter().map(|b| format_time(&b.bin_mid)).collect::<Vec<_>>(),
        "mean_predicted_lwc" => bins.iter().map(|b| b.mean_predicted_lwc).collect::<Vec<_>>(),
        "mean_visibility" => bins.iter().map(|b| b.mean_visibility_m).collect::<Vec<_>>(),
        "pair_count" => bins.iter().map(|b| b.pair_count as u64).collect::<Vec<_>>(),
        "obs_fog" => bins.iter().map(|b| b.obs_fog).collect::<Vec<_>>(),
        "pred_fog" => bins.iter().map(|b| b.pred_fog).collect::<Vec<_>>(),
    )
}

/// One row per [`SkillTable`] row: labels, raw counts, then the six scores in
/// [`SkillScores::NAMES`] order.
pub fn skill_table_frame(table: &SkillTable) -> PolarsResult<DataFrame> {
    fn counts(table: &SkillTable, cell: fn(&ConfusionMatrix) -> u64) -> Vec<u64> {
        table.rows.iter().map(|r| cell(&r.matrix)).collect()
    }

    let mut columns = vec![
        Column::new(
            "station".into(),
            table.rows.iter().map(|r| r.station.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "period".into(),
            table.rows.iter().map(|r| r.period.to_string()).collect::<Vec<_>>(),
        ),
        Column::new("TN".into(), counts(table, |m| m.tn)),
        Column::new("FP".into(), counts(table, |m| m.fp)),
        Column::new("FN".into(), counts(table, |m| m.fn_)),
        Column::new("TP".into(), counts(table, |m| m.tp)),
    ];
    for (i, name) in SkillScores::NAMES.iter().enumerate() {
        let values: Vec<f64> = table.rows.iter().map(|r| r.scores.as_array()[i]).collect();
        columns.push(Column::new((*name).into(), values));
    }
    DataFrame::new(columns)
}

/// Writes `df` with a header row, creating parent directories as needed.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TableError::WriteIo(parent.to_path_buf(), e))?;
    }
    let mut file = fs::File::create(path).map_err(|e| TableError::WriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| TableError::CsvWrite(path.to_path_buf(), e))
}

/// Station names become part of file names; anything outside `[A-Za-z0-9_-]` is
/// replaced, so distinct names can share a file name.
pub(crate) fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Paths of the prediction, merged and bin tables of `station` inside `dir`.
pub fn station_table_paths(dir: &Path, station: &str) -> [PathBuf; 3] {
    let stem = file_safe(station);
    [
        dir.join(format!("{stem}_predictions.csv")),
        dir.join(format!("{stem}_merged.csv")),
        dir.join(format!("{stem}_bins.csv")),
    ]
}

/// Writes the per-station tables of one month into `dir` at the paths given by
/// [`station_table_paths`]. Returns the written paths.
pub fn write_station_tables(
    dir: &Path,
    station: &str,
    predictions: &[PredictionSample],
    pairs: &[AlignedPair],
    bins: &[Bin],
) -> Result<Vec<PathBuf>, TableError> {
    let frames = [predictions_frame(predictions)?, pairs_frame(pairs)?, bins_frame(bins)?];
    let mut written = Vec::with_capacity(frames.len());
    for (path, mut df) in station_table_paths(dir, station).into_iter().zip(frames) {
        write_csv(&mut df, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Writes every skill table of `report` into `out_dir`:
/// `skill_{Month-Year}.csv` per month, `skill_master.csv` and `skill_grand_total.csv`.
pub fn write_report(report: &VerificationReport, out_dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    let mut written = Vec::new();
    for (month, table) in &report.monthly {
        let path = out_dir.join(format!("skill_{}.csv", month.file_stem()));
        write_csv(&mut skill_table_frame(table)?, &path)?;
        written.push(path);
    }

    let master = out_dir.join("skill_master.csv");
    write_csv(&mut skill_table_frame(&report.master)?, &master)?;
    written.push(master);

    let grand = out_dir.join("skill_grand_total.csv");
    write_csv(&mut skill_table_frame(&report.grand_total)?, &grand)?;
    written.push(grand);

    info!("Wrote {} skill tables to {:?}", written.len(), out_dir);
    Ok(written)
}
