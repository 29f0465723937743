use crate::types::samples::Bin;
use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counts of a 2×2 fog / no-fog contingency table.
///
/// Label order is fixed as `[no-fog = 0, fog = 1]`; [`ConfusionMatrix::as_array`] returns
/// `[[tn, fp], [fn, tp]]` with observations on rows and predictions on columns.
///
/// Matrices of disjoint bin sets add element-wise, which is how every pooled level is
/// built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ConfusionMatrix {
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tp: u64,
}

impl ConfusionMatrix {
    pub fn new(tn: u64, fp: u64, fn_: u64, tp: u64) -> Self {
        Self { tn, fp, fn_, tp }
    }

    /// Counts the label pairs of `bins`.
    pub fn from_bins<'a, I>(bins: I) -> Self
    where
        I: IntoIterator<Item = &'a Bin>,
    {
        let mut matrix = Self::default();
        for bin in bins {
            matrix.record(bin.obs_fog, bin.pred_fog);
        }
        matrix
    }

    pub fn record(&mut self, observed: bool, predicted: bool) {
        match (observed, predicted) {
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
            (true, true) => self.tp += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn as_array(&self) -> [[u64; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

impl Add for ConfusionMatrix {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            tn: self.tn + rhs.tn,
            fp: self.fp + rhs.fp,
            fn_: self.fn_ + rhs.fn_,
            tp: self.tp + rhs.tp,
        }
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ConfusionMatrix {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a ConfusionMatrix> for ConfusionMatrix {
    fn sum<I: Iterator<Item = &'a ConfusionMatrix>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bin(i: i64, obs_fog: bool, pred_fog: bool) -> Bin {
        let start = Utc.with_ymd_and_hms(2021, 12, 1, 0, 0, 0).unwrap() + Duration::hours(6 * i);
        Bin {
            station: "S".to_string(),
            bin_start: start,
            bin_mid: start + Duration::hours(3),
            mean_predicted_lwc: 0.0,
            mean_visibility_m: 0.0,
            pair_count: 1,
            obs_fog,
            pred_fog,
        }
    }

    #[test]
    fn test_cells() {
        let bins = vec![bin(0, true, true), bin(1, false, true), bin(2, true, false), bin(3, false, false), bin(4, true, true)];
        let matrix = ConfusionMatrix::from_bins(&bins);
        assert_eq!(matrix, ConfusionMatrix::new(1, 1, 1, 2));
        assert_eq!(matrix.as_array(), [[1, 1], [1, 2]]);
        assert_eq!(matrix.total(), 5);
    }

    #[test]
    fn test_union_equals_sum() {
        let a: Vec<Bin> = (0..7).map(|i| bin(i, i % 2 == 0, i % 3 == 0)).collect();
        let b: Vec<Bin> = (7..19).map(|i| bin(i, i % 5 == 0, i % 2 == 1)).collect();
        let union: Vec<Bin> = a.iter().chain(&b).cloned().collect();
        assert_eq!(
            ConfusionMatrix::from_bins(&union),
            ConfusionMatrix::from_bins(&a) + ConfusionMatrix::from_bins(&b)
        );
    }

    #[test]
    fn test_sum_of_matrices() {
        let matrices = [ConfusionMatrix::new(1, 2, 3, 4), ConfusionMatrix::new(10, 0, 0, 1)];
        let total: ConfusionMatrix = matrices.iter().sum();
        assert_eq!(total, ConfusionMatrix::new(11, 2, 3, 5));
        assert!(ConfusionMatrix::default().is_empty());
    }
}
