use crate::prediction::error::ModelError;
use crate::prediction::features::FeatureVector;

/// An externally trained estimator of cloud water mixing ratio.
///
/// Given `k` feature vectors (no missing values) it must return exactly `k` predicted
/// mixing ratios in kg/kg. Implementations are shared between worker threads, so they
/// must be callable concurrently.
///
/// Any `Fn(&[FeatureVector]) -> Result<Vec<f64>, ModelError>` closure is a model, which
/// keeps deterministic stubs short:
///
/// ```
/// use fogverify::{CloudWaterModel, FeatureVector};
///
/// let model = |features: &[FeatureVector]| {
///     Ok::<_, fogverify::ModelError>(features.iter().map(|f| f[1] * 1e-3).collect())
/// };
/// let out = model.predict(&[[95.0, 0.01, 2.0]]).unwrap();
/// assert_eq!(out.len(), 1);
/// ```
pub trait CloudWaterModel: Send + Sync {
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ModelError>;
}

impl<F> CloudWaterModel for F
where
    F: Fn(&[FeatureVector]) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        self(features)
    }
}
