//! Nearest-in-time join of a station's predictions with its observations.

use crate::types::samples::{AlignedPair, ObservationSample, PredictionSample};
use chrono::Duration;

/// Matches every prediction with the nearest observation, as long as the two are at most
/// `tolerance` apart.
///
/// Each prediction yields at most one [`AlignedPair`]; predictions without an observation
/// in range yield nothing. The same observation may be the nearest for several
/// predictions.
#[derive(Debug, Clone, Copy)]
pub struct TemporalAligner {
    tolerance: Duration,
}

impl TemporalAligner {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Joins one station's predictions and observations.
    ///
    /// Predictions without a value and non-finite visibilities are dropped first. Both
    /// inputs are then walked once in time order (two pointers). On equal distance the
    /// earlier observation wins; among observations sharing a timestamp the first in
    /// input order wins. The pair carries the prediction's timestamp.
    pub fn align(
        &self,
        predictions: &[PredictionSample],
        observations: &[ObservationSample],
    ) -> Vec<AlignedPair> {
        let mut predictions: Vec<(&PredictionSample, f64)> = predictions
            .iter()
            .filter_map(|p| match p.predicted_lwc {
                Some(lwc) if lwc.is_finite() => Some((p, lwc)),
                _ => None,
            })
            .collect();
        predictions.sort_by_key(|(p, _)| p.time);

        let mut observations: Vec<&ObservationSample> = observations
            .iter()
            .filter(|o| o.visibility_m.is_finite())
            .collect();
        observations.sort_by_key(|o| o.time);

        let mut pairs = Vec::new();
        // `next` is the first observation strictly after the current prediction.
        let mut next = 0;
        for (prediction, lwc) in predictions {
            while next < observations.len() && observations[next].time <= prediction.time {
                next += 1;
            }

            let before = next.checked_sub(1).map(|mut i| {
                while i > 0 && observations[i - 1].time == observations[i].time {
                    i -= 1;
                }
                (i, prediction.time - observations[i].time)
            });
            let after = (next < observations.len())
                .then(|| (next, observations[next].time - prediction.time));

            let nearest = match (before, after) {
                (Some(b), Some(a)) => Some(if b.1 <= a.1 { b } else { a }),
                (b, a) => b.or(a),
            };

            if let Some((i, delta)) = nearest {
                if delta <= self.tolerance {
                    pairs.push(AlignedPair {
                        station: prediction.station.clone(),
                        time: prediction.time,
                        predicted_lwc: lwc,
                        visibility_m: observations[i].visibility_m,
                    });
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 11, 3, h, m, 0).unwrap()
    }

    fn pred(h: u32, m: u32, lwc: f64) -> PredictionSample {
        PredictionSample {
            station: "S".to_string(),
            time: at(h, m),
            predicted_lwc: Some(lwc),
        }
    }

    fn obs(h: u32, m: u32, vis: f64) -> ObservationSample {
        ObservationSample {
            station: "S".to_string(),
            time: at(h, m),
            visibility_m: vis,
        }
    }

    #[test]
    fn test_tolerance_cutoff() {
        let predictions = vec![pred(10, 0, 0.02)];
        let observations = vec![obs(10, 25, 800.0)];

        let within = TemporalAligner::new(Duration::minutes(30)).align(&predictions, &observations);
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].time, at(10, 0));
        assert_eq!(within[0].visibility_m, 800.0);

        let outside = TemporalAligner::new(Duration::minutes(20)).align(&predictions, &observations);
        assert!(outside.is_empty());
    }

    #[test]
    fn test_nearest_wins_and_earlier_breaks_ties() {
        let observations = vec![obs(9, 50, 100.0), obs(10, 5, 200.0), obs(10, 40, 300.0), obs(11, 20, 400.0)];
        let predictions = vec![pred(10, 0, 0.1), pred(11, 0, 0.1)];
        let pairs = TemporalAligner::new(Duration::minutes(30)).align(&predictions, &observations);
        assert_eq!(pairs.len(), 2);
        // 10:05 is 5 min away, 09:50 is 10 min away
        assert_eq!(pairs[0].visibility_m, 200.0);
        // 10:40 and 11:20 are both 20 min away from 11:00
        assert_eq!(pairs[1].visibility_m, 300.0);
    }

    #[test]
    fn test_exact_match_and_duplicate_timestamps() {
        let observations = vec![obs(12, 0, 700.0), obs(12, 0, 900.0)];
        let pairs = TemporalAligner::new(Duration::minutes(10)).align(&[pred(12, 0, 0.0)], &observations);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].visibility_m, 700.0);
    }

    #[test]
    fn test_missing_values_dropped() {
        let predictions = vec![
            PredictionSample {
                station: "S".to_string(),
                time: at(10, 0),
                predicted_lwc: None,
            },
            pred(11, 0, f64::NAN),
            pred(12, 0, 0.5),
        ];
        let observations = vec![obs(10, 0, 100.0), obs(11, 0, 100.0), obs(12, 0, f64::NAN)];
        let pairs = TemporalAligner::new(Duration::minutes(90)).align(&predictions, &observations);
        // 12:00 falls back to the 11:00 observation
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].time, at(12, 0));
        assert_eq!(pairs[0].visibility_m, 100.0);
    }

    #[test]
    fn test_no_observations() {
        let pairs = TemporalAligner::new(Duration::minutes(30)).align(&[pred(10, 0, 0.1)], &[]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_unsorted_inputs() {
        let predictions = vec![pred(13, 0, 0.3), pred(10, 0, 0.1)];
        let observations = vec![obs(13, 10, 3.0), obs(10, 10, 1.0)];
        let pairs = TemporalAligner::new(Duration::minutes(15)).align(&predictions, &observations);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].visibility_m, 1.0);
        assert_eq!(pairs[1].visibility_m, 3.0);
    }

    #[test]
    fn test_pair_count_monotonic_in_tolerance() {
        let predictions: Vec<_> = (0..24).map(|h| pred(h, 0, 0.01)).collect();
        let observations: Vec<_> = [(0, 20), (3, 45), (7, 5), (7, 55), (15, 31), (22, 10)]
            .iter()
            .map(|&(h, m)| obs(h, m, 500.0))
            .collect();
        let mut last = 0;
        for minutes in [1, 5, 10, 20, 29, 30, 31, 45, 60, 120, 600] {
            let n = TemporalAligner::new(Duration::minutes(minutes))
                .align(&predictions, &observations)
                .len();
            assert!(n >= last, "tolerance {} produced {} < {}", minutes, n, last);
            last = n;
        }
        assert_eq!(last, 24);
    }
}
