//! Entry point that runs the whole verification: station mapping, prediction, temporal
//! alignment, binning and pooled scoring, for one month or for a directory of months.

use crate::alignment::aligner::TemporalAligner;
use crate::alignment::binner::Binner;
use crate::config::VerificationConfig;
use crate::error::FogVerifyError;
use crate::observations::series::ObservationSet;
use crate::prediction::aggregator::PredictionAggregator;
use crate::prediction::error::PredictionError;
use crate::prediction::fields::GridFields;
use crate::prediction::model::CloudWaterModel;
use crate::scoring::hierarchy::{HierarchicalAggregator, VerificationReport};
use crate::sources::{discover_grid_sources, GridLoader, GridSourceFile};
use crate::spatial::grid_index::GridIndex;
use crate::spatial::station_mapper::{StationCells, StationMapping};
use crate::tables::error::TableError;
use crate::tables::reader::{read_observations, read_station_registry};
use crate::tables::writer::{file_safe, station_table_paths, write_report, write_station_tables};
use crate::types::period::Month;
use crate::types::samples::{AlignedPair, Bin, PredictionSample};
use crate::types::station::Station;
use bon::bon;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

/// Why a station produced no skill row for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NoObservations,
    NoAlignedPairs,
    NoBins,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoObservations => write!(f, "no observations"),
            SkipReason::NoAlignedPairs => {
                write!(f, "no observation within tolerance of any prediction")
            }
            SkipReason::NoBins => write!(f, "no bins"),
        }
    }
}

/// Intermediate results of one station for one month.
#[derive(Debug, Clone, Serialize)]
pub struct StationOutcome {
    pub station: String,
    /// Number of grid cells representing the station.
    pub cell_count: usize,
    pub nearest_fallback: bool,
    pub predictions: Vec<PredictionSample>,
    pub pairs: Vec<AlignedPair>,
    pub bins: Vec<Bin>,
}

impl StationOutcome {
    fn skip_reason(&self, observation_count: usize) -> Option<SkipReason> {
        if observation_count == 0 {
            Some(SkipReason::NoObservations)
        } else if self.pairs.is_empty() {
            Some(SkipReason::NoAlignedPairs)
        } else if self.bins.is_empty() {
            Some(SkipReason::NoBins)
        } else {
            None
        }
    }
}

/// Everything computed for one grid source.
#[derive(Debug, Clone, Serialize)]
pub struct MonthOutcome {
    pub period: Month,
    /// Grid file the month was loaded from, when it came through a [`GridLoader`].
    pub source: Option<PathBuf>,
    /// Stations with at least one bin, in registry order.
    pub stations: Vec<StationOutcome>,
    /// Stations left out of scoring this month.
    pub skipped: Vec<(String, SkipReason)>,
}

/// The result of [`FogVerifier::verify_sources`]: per-month outcomes sorted by month,
/// and the skill tables pooled over all of them.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationRun {
    pub months: Vec<MonthOutcome>,
    pub report: VerificationReport,
}

impl VerificationRun {
    /// Pools the bins of `months` into a report. Nothing is scored until every month has
    /// been added.
    pub fn from_months(mut months: Vec<MonthOutcome>) -> Self {
        months.sort_by_key(|m| m.period);
        let mut aggregator = HierarchicalAggregator::new();
        for month in &months {
            for station in &month.stations {
                aggregator.add_bins(month.period, &station.station, &station.bins);
            }
        }
        Self {
            report: aggregator.report(),
            months,
        }
    }

    /// Directory of the per-station tables of `month`: `{Month-Year}`, or
    /// `{Month-Year}_{source file}` when several sources cover the same month.
    fn month_dir(&self, out_dir: &Path, month: &MonthOutcome) -> PathBuf {
        let sharing = self.months.iter().filter(|m| m.period == month.period).count();
        match &month.source {
            Some(source) if sharing > 1 => {
                let file_name = source.file_name().unwrap_or(source.as_os_str());
                out_dir.join(format!(
                    "{}_{}",
                    month.period.file_stem(),
                    file_safe(&file_name.to_string_lossy())
                ))
            }
            _ => out_dir.join(month.period.file_stem()),
        }
    }

    /// Writes per-station prediction, merged and bin tables, then every skill table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutputCollision`] before writing anything if two stations (or
    /// two sources of one month) would share an output file.
    pub fn write_tables(&self, out_dir: &Path) -> Result<Vec<PathBuf>, TableError> {
        let mut planned = Vec::new();
        let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
        for month in &self.months {
            let dir = self.month_dir(out_dir, month);
            for station in &month.stations {
                for path in station_table_paths(&dir, &station.station) {
                    if let Some(first) = claimed.insert(path.clone(), &station.station) {
                        return Err(TableError::OutputCollision {
                            path,
                            first: first.to_string(),
                            second: station.station.clone(),
                        });
                    }
                }
                planned.push((dir.clone(), station));
            }
        }

        let mut written = Vec::new();
        for (dir, station) in planned {
            written.extend(write_station_tables(
                &dir,
                &station.station,
                &station.predictions,
                &station.pairs,
                &station.bins,
            )?);
        }
        written.extend(write_report(&self.report, out_dir)?);
        Ok(written)
    }
}

/// Verifies gridded fog predictions against station visibility observations.
///
/// A `FogVerifier` owns the configuration, the station registry, the observation series
/// and the cloud water model. All of them are shared read-only, so the verifier is cheap
/// to clone into worker tasks.
///
/// # Examples
///
/// ```rust
/// # use fogverify::{FogVerifier, FogVerifyError, ObservationSet, Station, VerificationConfig};
/// # use fogverify::{FeatureVector, ModelError};
/// # use std::sync::Arc;
/// # fn run() -> Result<(), FogVerifyError> {
/// let verifier = FogVerifier::builder()
///     .config(VerificationConfig::default())
///     .stations(vec![Station::new("EHAM", 52.31, 4.76)])
///     .observations(ObservationSet::default())
///     .model(Arc::new(|batch: &[FeatureVector]| {
///         Ok::<_, ModelError>(batch.iter().map(|f| f[0] * 1e-7).collect())
///     }))
///     .build()?;
/// assert_eq!(verifier.stations().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FogVerifier {
    config: Arc<VerificationConfig>,
    stations: Arc<[Station]>,
    observations: Arc<ObservationSet>,
    predictor: PredictionAggregator,
    aligner: TemporalAligner,
    binner: Binner,
}

#[bon]
impl FogVerifier {
    /// Creates a verifier after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FogVerifyError::Config`] if a configured value is out of range.
    #[builder]
    pub fn new(
        config: VerificationConfig,
        stations: Vec<Station>,
        observations: ObservationSet,
        model: Arc<dyn CloudWaterModel>,
    ) -> Result<Self, FogVerifyError> {
        config.validate()?;
        Ok(Self {
            predictor: PredictionAggregator::new(model, config.air_density),
            aligner: TemporalAligner::new(config.tolerance()),
            binner: Binner::new(config.bin_width(), config.thresholds()),
            config: Arc::new(config),
            stations: stations.into(),
            observations: Arc::new(observations),
        })
    }

    /// Creates a verifier from a station registry CSV and an observation CSV.
    ///
    /// Both tables are read on a blocking worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`FogVerifyError::Config`] for an invalid `config` and
    /// [`FogVerifyError::Table`] if either table cannot be read.
    pub async fn from_tables(
        config: VerificationConfig,
        registry: &Path,
        observations: &Path,
        model: Arc<dyn CloudWaterModel>,
    ) -> Result<Self, FogVerifyError> {
        config.validate()?;
        let registry = registry.to_path_buf();
        let observations = observations.to_path_buf();
        let cap = config.visibility_cap_m;
        let (stations, observations) = task::spawn_blocking(move || {
            Ok::<_, TableError>((
                read_station_registry(&registry)?,
                read_observations(&observations, cap)?,
            ))
        })
        .await??;

        Self::builder()
            .config(config)
            .stations(stations)
            .observations(observations)
            .model(model)
            .build()
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn observations(&self) -> &ObservationSet {
        &self.observations
    }

    /// Verifies every station against one month of grid fields.
    ///
    /// Stations run in parallel. A station whose model inputs cannot be imputed at some
    /// timestep only loses that timestep. Stations without observations, without
    /// aligned pairs or without bins are listed in [`MonthOutcome::skipped`].
    ///
    /// # Errors
    ///
    /// Fails on an invalid grid or if the cloud water model fails.
    pub fn verify_month(
        &self,
        period: Month,
        fields: &GridFields,
    ) -> Result<MonthOutcome, FogVerifyError> {
        info!(
            "Verifying {}: {} stations, {} timesteps, {} grid cells",
            period,
            self.stations.len(),
            fields.times().len(),
            fields.geometry().len()
        );
        let index = GridIndex::new(fields.geometry())?;
        let mapping = StationMapping::build(&index, &self.stations, self.config.search_radius_km)?;

        let outcomes = mapping
            .entries()
            .par_iter()
            .map(|cells| self.verify_station(fields, cells))
            .collect::<Result<Vec<_>, PredictionError>>()?;

        let mut month = MonthOutcome {
            period,
            source: None,
            stations: Vec::with_capacity(outcomes.len()),
            skipped: Vec::new(),
        };
        for outcome in outcomes {
            let observation_count = self.observations.station(&outcome.station).len();
            match outcome.skip_reason(observation_count) {
                None => month.stations.push(outcome),
                Some(reason) => {
                    warn!("Skipping station {} for {}: {}", outcome.station, period, reason);
                    month.skipped.push((outcome.station, reason));
                }
            }
        }
        info!(
            "Finished {}: {} stations scored, {} skipped",
            period,
            month.stations.len(),
            month.skipped.len()
        );
        Ok(month)
    }

    fn verify_station(
        &self,
        fields: &GridFields,
        cells: &StationCells,
    ) -> Result<StationOutcome, PredictionError> {
        let name = &cells.station.name;
        let observations = self.observations.station(name);

        let mut outcome = StationOutcome {
            station: name.clone(),
            cell_count: cells.cells.len(),
            nearest_fallback: cells.nearest_fallback,
            predictions: Vec::new(),
            pairs: Vec::new(),
            bins: Vec::new(),
        };
        if observations.is_empty() {
            return Ok(outcome);
        }

        outcome.predictions = self.predictor.predict_series(fields, cells)?;
        outcome.pairs = self.aligner.align(&outcome.predictions, observations);
        outcome.bins = self.binner.bin(&outcome.pairs);
        Ok(outcome)
    }

    fn load_and_verify(
        &self,
        loader: &dyn GridLoader,
        source: &GridSourceFile,
    ) -> Result<MonthOutcome, FogVerifyError> {
        info!("Loading grid for {} from {:?}", source.period, source.path);
        let fields = loader.load(source).map_err(|source_err| FogVerifyError::GridLoad {
            period: source.period,
            path: source.path.clone(),
            source: source_err,
        })?;
        let mut month = self.verify_month(source.period, &fields)?;
        month.source = Some(source.path.clone());
        Ok(month)
    }

    /// Verifies several grid sources concurrently and pools the results.
    ///
    /// Each source is loaded and verified on a blocking worker thread; at most
    /// [`VerificationConfig::month_concurrency`] run at once. Scoring starts only after
    /// every month has finished.
    ///
    /// # Errors
    ///
    /// The first failing month aborts the run; its error is returned.
    pub async fn verify_sources(
        &self,
        loader: Arc<dyn GridLoader>,
        sources: Vec<GridSourceFile>,
    ) -> Result<VerificationRun, FogVerifyError> {
        if sources.is_empty() {
            return Err(FogVerifyError::NoSourcesGiven);
        }
        let semaphore = Arc::new(Semaphore::new(self.config.month_concurrency()));
        let mut tasks = JoinSet::new();
        for source in sources {
            let verifier = self.clone();
            let loader = Arc::clone(&loader);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                task::spawn_blocking(move || verifier.load_and_verify(loader.as_ref(), &source)).await?
            });
        }

        let mut months = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            months.push(joined??);
        }
        Ok(VerificationRun::from_months(months))
    }

    /// Discovers the `{month}-{year}.<ext>` files in `dir` and verifies all of them.
    ///
    /// # Errors
    ///
    /// Returns [`FogVerifyError::NoGridSources`] if `dir` contains no grid source.
    pub async fn verify_directory(
        &self,
        loader: Arc<dyn GridLoader>,
        dir: &Path,
    ) -> Result<VerificationRun, FogVerifyError> {
        let sources = discover_grid_sources(dir)?;
        self.verify_sources(loader, sources).await
    }
}
