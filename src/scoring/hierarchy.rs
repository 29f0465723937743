//! Pooled skill scores at station, month and run level.
//!
//! Only raw contingency counts are ever combined. Each row of every table scores its own
//! pooled [`ConfusionMatrix`]; there is deliberately no way to feed already computed
//! [`SkillScores`] back into the aggregator.

use crate::scoring::confusion::ConfusionMatrix;
use crate::scoring::skill::SkillScores;
use crate::types::period::{Month, PeriodLabel};
use crate::types::samples::Bin;
use log::warn;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Row label pooling every station of a month.
pub const ALL_COMBINED: &str = "ALL COMBINED";
/// Row label pooling every station, or every month.
pub const ALL: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRow {
    pub station: String,
    pub period: PeriodLabel,
    pub matrix: ConfusionMatrix,
    pub scores: SkillScores,
}

impl SkillRow {
    fn new(station: impl Into<String>, period: PeriodLabel, matrix: ConfusionMatrix) -> Self {
        Self {
            station: station.into(),
            period,
            scores: SkillScores::from_matrix(&matrix),
            matrix,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkillTable {
    pub rows: Vec<SkillRow>,
}

impl SkillTable {
    pub fn row(&self, station: &str, period: PeriodLabel) -> Option<&SkillRow> {
        self.rows
            .iter()
            .find(|r| r.station == station && r.period == period)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every skill table of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    /// Per month: one row per station with bins, then the `ALL COMBINED` row.
    pub monthly: BTreeMap<Month, SkillTable>,
    /// Station × month rows followed by each station's `ALL` row.
    pub master: SkillTable,
    /// A single `ALL` × `ALL` row.
    pub grand_total: SkillTable,
}

/// Collects binned results from every station and month, then scores each aggregation
/// level from pooled counts.
///
/// The aggregator is a barrier: feed it everything first, then call
/// [`HierarchicalAggregator::report`].
#[derive(Debug, Clone, Default)]
pub struct HierarchicalAggregator {
    leaves: BTreeMap<(String, Month), ConfusionMatrix>,
}

impl HierarchicalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one station's bins for one month. Adding the same station and month twice
    /// pools both sets.
    pub fn add_bins(&mut self, month: Month, station: &str, bins: &[Bin]) {
        if bins.is_empty() {
            warn!("Station {} has no bins for {}, no skill row emitted", station, month);
            return;
        }
        *self
            .leaves
            .entry((station.to_string(), month))
            .or_default() += ConfusionMatrix::from_bins(bins);
    }

    /// Pools the counts of another aggregator into this one.
    pub fn merge(&mut self, other: HierarchicalAggregator) {
        for (key, matrix) in other.leaves {
            *self.leaves.entry(key).or_default() += matrix;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Pooled matrix of one station and month, if it has bins.
    pub fn station_month(&self, station: &str, month: Month) -> Option<ConfusionMatrix> {
        self.leaves.get(&(station.to_string(), month)).copied()
    }

    pub fn report(&self) -> VerificationReport {
        let months: BTreeSet<Month> = self.leaves.keys().map(|(_, m)| *m).collect();
        let stations: BTreeSet<&str> = self.leaves.keys().map(|(s, _)| s.as_str()).collect();

        let monthly = months
            .iter()
            .map(|&month| {
                let mut rows: Vec<SkillRow> = self
                    .leaves
                    .iter()
                    .filter(|((_, m), _)| *m == month)
                    .map(|((station, _), matrix)| {
                        SkillRow::new(station.as_str(), PeriodLabel::Month(month), *matrix)
                    })
                    .collect();
                let combined: ConfusionMatrix = rows.iter().map(|r| r.matrix).sum();
                rows.push(SkillRow::new(ALL_COMBINED, PeriodLabel::Month(month), combined));
                (month, SkillTable { rows })
            })
            .collect();

        let mut master = SkillTable::default();
        for station in &stations {
            let mut station_total = ConfusionMatrix::default();
            for ((_, month), matrix) in self.leaves.iter().filter(|((s, _), _)| s == station) {
                master
                    .rows
                    .push(SkillRow::new(*station, PeriodLabel::Month(*month), *matrix));
                station_total += *matrix;
            }
            master
                .rows
                .push(SkillRow::new(*station, PeriodLabel::All, station_total));
        }

        let grand: ConfusionMatrix = self.leaves.values().sum();
        let grand_total = SkillTable {
            rows: vec![SkillRow::new(ALL, PeriodLabel::All, grand)],
        };

        VerificationReport {
            monthly,
            master,
            grand_total,
        }
    }
}
