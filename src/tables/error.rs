use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read CSV table '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Required column '{column}' missing or not convertible in '{path}'")]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error writing table '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV table '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Output '{path}' would be written for both '{first}' and '{second}'")]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed building DataFrame: {0}")]
    DataFrameBuild(#[from] PolarsError),
}
