use crate::config::ConfigError;
use crate::prediction::error::PredictionError;
use crate::sources::LoadError;
use crate::spatial::error::SpatialError;
use crate::tables::error::TableError;
use crate::types::period::Month;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FogVerifyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("No '{{month}}-{{year}}' grid source files found in '{0}'")]
    NoGridSources(PathBuf),

    #[error("No grid sources were given")]
    NoSourcesGiven,

    #[error("Failed to list grid source directory '{0}'")]
    SourceDirRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to load grid source for {period} from '{path}'")]
    GridLoad {
        period: Month,
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("Month scheduler was closed before all months ran")]
    SchedulerClosed(#[from] tokio::sync::AcquireError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
