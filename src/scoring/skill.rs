//! Categorical skill scores derived from a fog confusion matrix.

use crate::scoring::confusion::ConfusionMatrix;
use crate::types::samples::Bin;
use serde::Serialize;

/// Skill scores in percent, each in `[0, 100]`.
///
/// Any ratio whose denominator is zero is defined as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SkillScores {
    /// (TP + TN) / N
    pub accuracy: f64,
    /// Probability of detection, TP / (TP + FN)
    pub pod: f64,
    /// False alarm ratio, FP / (TP + FP)
    pub far: f64,
    /// 2TP / (2TP + FP + FN), the harmonic mean of precision and POD
    pub f1: f64,
    /// Critical success index, TP / (TP + FP + FN)
    pub csi: f64,
    /// Probability of false detection, FP / (FP + TN)
    pub pofd: f64,
}

fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

impl SkillScores {
    /// Scores of a confusion matrix. Pure; used unchanged at every aggregation level.
    pub fn from_matrix(m: &ConfusionMatrix) -> Self {
        Self {
            accuracy: percent(m.tp + m.tn, m.total()),
            pod: percent(m.tp, m.tp + m.fn_),
            far: percent(m.fp, m.tp + m.fp),
            f1: percent(2 * m.tp, 2 * m.tp + m.fp + m.fn_),
            csi: percent(m.tp, m.tp + m.fp + m.fn_),
            pofd: percent(m.fp, m.fp + m.tn),
        }
    }

    /// Builds the confusion matrix of `bins` and scores it.
    pub fn from_bins<'a, I>(bins: I) -> (ConfusionMatrix, Self)
    where
        I: IntoIterator<Item = &'a Bin>,
    {
        let matrix = ConfusionMatrix::from_bins(bins);
        (matrix, Self::from_matrix(&matrix))
    }

    /// Column order used by every skill table.
    pub const NAMES: [&'static str; 6] = ["Accuracy", "POD", "FAR", "F1", "CSI", "POFD"];

    pub fn as_array(&self) -> [f64; 6] {
        [self.accuracy, self.pod, self.far, self.f1, self.csi, self.pofd]
    }
}
