//! Process-wide verification settings.
//!
//! Every component that needs a threshold, radius or window receives it from a
//! [`VerificationConfig`] at construction time; nothing reads ambient global state.

use bon::Builder;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 3.0;
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 30;
pub const DEFAULT_BIN_WIDTH_MINUTES: i64 = 360;
pub const DEFAULT_FOG_VISIBILITY_M: f64 = 1000.0;
pub const DEFAULT_FOG_LWC_GM3: f64 = 0.01;
pub const DEFAULT_VISIBILITY_CAP_M: f64 = 10_000.0;
/// Near-surface air density in kg/m³.
pub const DEFAULT_AIR_DENSITY: f64 = 1.225;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Config value '{field}' must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Settings shared by every stage of a verification run.
///
/// # Examples
///
/// ```
/// use fogverify::VerificationConfig;
///
/// let config = VerificationConfig::builder()
///     .search_radius_km(5.0)
///     .tolerance_minutes(60)
///     .build();
/// assert_eq!(config.bin_width_minutes, 360);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Radius around a station in which grid cells represent it.
    #[builder(default = DEFAULT_SEARCH_RADIUS_KM)]
    pub search_radius_km: f64,
    /// Maximum gap between a prediction and the observation matched to it.
    #[builder(default = DEFAULT_TOLERANCE_MINUTES)]
    pub tolerance_minutes: i64,
    /// Width of the averaging windows used before classification.
    #[builder(default = DEFAULT_BIN_WIDTH_MINUTES)]
    pub bin_width_minutes: i64,
    /// Observed fog when mean visibility is strictly below this value (m).
    #[builder(default = DEFAULT_FOG_VISIBILITY_M)]
    pub fog_visibility_threshold_m: f64,
    /// Predicted fog when mean LWC is strictly above this value (g/m³).
    #[builder(default = DEFAULT_FOG_LWC_GM3)]
    pub fog_lwc_threshold_gm3: f64,
    /// Observed visibilities above this value are clamped to it.
    #[builder(default = DEFAULT_VISIBILITY_CAP_M)]
    pub visibility_cap_m: f64,
    #[builder(default = DEFAULT_AIR_DENSITY)]
    pub air_density: f64,
    /// Upper bound on month files processed at once. `None` uses the number of cores.
    pub max_concurrent_months: Option<usize>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VerificationConfig {
    /// Loads a config from a JSON file. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("search_radius_km", self.search_radius_km),
            ("tolerance_minutes", self.tolerance_minutes as f64),
            ("bin_width_minutes", self.bin_width_minutes as f64),
            ("visibility_cap_m", self.visibility_cap_m),
            ("air_density", self.air_density),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }

    pub fn tolerance(&self) -> Duration {
        Duration::minutes(self.tolerance_minutes)
    }

    pub fn bin_width(&self) -> Duration {
        Duration::minutes(self.bin_width_minutes)
    }

    pub fn thresholds(&self) -> FogThresholds {
        FogThresholds {
            visibility_m: self.fog_visibility_threshold_m,
            lwc_gm3: self.fog_lwc_threshold_gm3,
        }
    }

    pub fn month_concurrency(&self) -> usize {
        self.max_concurrent_months
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

/// The two independent fog classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogThresholds {
    pub visibility_m: f64,
    pub lwc_gm3: f64,
}

impl FogThresholds {
    pub fn observed_fog(&self, visibility_m: f64) -> bool {
        visibility_m < self.visibility_m
    }

    pub fn predicted_fog(&self, lwc_gm3: f64) -> bool {
        lwc_gm3 > self.lwc_gm3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VerificationConfig::default();
        assert_eq!(config.search_radius_km, DEFAULT_SEARCH_RADIUS_KM);
        assert_eq!(config.tolerance(), Duration::minutes(30));
        assert_eq!(config.bin_width(), Duration::hours(6));
        assert!(config.validate().is_ok());
        assert!(config.month_concurrency() >= 1);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let thresholds = VerificationConfig::default().thresholds();
        assert!(thresholds.observed_fog(800.0));
        assert!(!thresholds.observed_fog(1000.0));
        assert!(thresholds.predicted_fog(0.02));
        assert!(!thresholds.predicted_fog(0.01));
    }

    #[test]
    fn test_validate_rejects_zero_tolerance() {
        let config = VerificationConfig::builder().tolerance_minutes(0).build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "tolerance_minutes",
                ..
            })
        ));
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"search_radius_km": 7.5, "tolerance_minutes": 60}}"#).unwrap();
        let config = VerificationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.search_radius_km, 7.5);
        assert_eq!(config.tolerance_minutes, 60);
        assert_eq!(config.fog_visibility_threshold_m, DEFAULT_FOG_VISIBILITY_M);
        assert_eq!(config.max_concurrent_months, None);
    }
}
