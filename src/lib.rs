mod alignment;
mod config;
mod error;
mod observations;
mod prediction;
mod scoring;
mod sources;
mod spatial;
mod tables;
mod types;
mod verifier;

pub use error::FogVerifyError;
pub use verifier::*;

pub use config::{ConfigError, FogThresholds, VerificationConfig};
pub use config::{
    DEFAULT_AIR_DENSITY, DEFAULT_BIN_WIDTH_MINUTES, DEFAULT_FOG_LWC_GM3, DEFAULT_FOG_VISIBILITY_M,
    DEFAULT_SEARCH_RADIUS_KM, DEFAULT_TOLERANCE_MINUTES, DEFAULT_VISIBILITY_CAP_M,
};

pub use types::grid::*;
pub use types::period::*;
pub use types::samples::*;
pub use types::station::*;

pub use spatial::error::SpatialError;
pub use spatial::grid_index::{GridIndex, EARTH_RADIUS_KM};
pub use spatial::station_mapper::{StationCells, StationMapping};

pub use prediction::aggregator::PredictionAggregator;
pub use prediction::error::{ModelError, PredictionError};
pub use prediction::features::{feature_vector, impute_batch_means, FeatureVector, FEATURE_NAMES};
pub use prediction::fields::GridFields;
pub use prediction::model::CloudWaterModel;

pub use observations::series::{parse_timestamp, ObservationSet, RawObservation};
pub use observations::visibility::{cap_visibility, parse_visibility_token, MISSING_VISIBILITY_SENTINEL};

pub use alignment::aligner::TemporalAligner;
pub use alignment::binner::Binner;

pub use scoring::confusion::ConfusionMatrix;
pub use scoring::hierarchy::{
    HierarchicalAggregator, SkillRow, SkillTable, VerificationReport, ALL, ALL_COMBINED,
};
pub use scoring::skill::SkillScores;

pub use sources::{discover_grid_sources, GridLoader, GridSourceFile, LoadError};

pub use tables::error::TableError;
pub use tables::reader::{read_observations, read_station_registry};
pub use tables::writer::{
    bins_frame, pairs_frame, predictions_frame, skill_table_frame, station_table_paths, write_csv,
    write_report, write_station_tables,
};
