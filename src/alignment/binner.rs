use crate::config::FogThresholds;
use crate::types::samples::{AlignedPair, Bin};
use chrono::Duration;
use std::collections::BTreeMap;

#[derive(Default)]
struct BinAccumulator {
    lwc_sum: f64,
    visibility_sum: f64,
    count: usize,
}

/// Averages aligned pairs over fixed-width windows and classifies each window.
///
/// Windows are left-closed and labelled by their start. They are anchored at the first
/// aligned timestamp of each station rather than at calendar boundaries, and windows
/// without pairs are not emitted.
#[derive(Debug, Clone, Copy)]
pub struct Binner {
    width: Duration,
    thresholds: FogThresholds,
}

impl Binner {
    pub fn new(width: Duration, thresholds: FogThresholds) -> Self {
        Self { width, thresholds }
    }

    /// Bins the aligned pairs. Pairs of different stations are binned independently;
    /// output is ordered by station, then by `bin_start`.
    pub fn bin(&self, pairs: &[AlignedPair]) -> Vec<Bin> {
        let width_ms = self.width.num_milliseconds().max(1);

        let mut by_station: BTreeMap<&str, Vec<&AlignedPair>> = BTreeMap::new();
        for pair in pairs {
            by_station.entry(pair.station.as_str()).or_default().push(pair);
        }

        let mut bins = Vec::new();
        for (station, mut station_pairs) in by_station {
            station_pairs.sort_by_key(|p| p.time);
            let origin = station_pairs[0].time;

            let mut windows: BTreeMap<i64, BinAccumulator> = BTreeMap::new();
            for pair in station_pairs {
                let offset_ms = (pair.time - origin).num_milliseconds();
                let acc = windows.entry(offset_ms.div_euclid(width_ms)).or_default();
                acc.lwc_sum += pair.predicted_lwc;
                acc.visibility_sum += pair.visibility_m;
                acc.count += 1;
            }

            bins.extend(windows.into_iter().map(|(window, acc)| {
                let bin_start = origin + Duration::milliseconds(window * width_ms);
                let mean_predicted_lwc = acc.lwc_sum / acc.count as f64;
                let mean_visibility_m = acc.visibility_sum / acc.count as f64;
                Bin {
                    station: station.to_string(),
                    bin_start,
                    bin_mid: bin_start + Duration::milliseconds(width_ms / 2),
                    mean_predicted_lwc,
                    mean_visibility_m,
                    pair_count: acc.count,
                    obs_fog: self.thresholds.observed_fog(mean_visibility_m),
                    pred_fog: self.thresholds.predicted_fog(mean_predicted_lwc),
                }
            }));
        }
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn thresholds() -> FogThresholds {
        FogThresholds {
            visibility_m: 1000.0,
            lwc_gm3: 0.01,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 2, 1, h, m, 0).unwrap()
    }

    fn pair(station: &str, time: DateTime<Utc>, lwc: f64, vis: f64) -> AlignedPair {
        AlignedPair {
            station: station.to_string(),
            time,
            predicted_lwc: lwc,
            visibility_m: vis,
        }
    }

    #[test]
    fn test_windows_anchor_at_first_timestamp() {
        let pairs = vec![
            pair("S", at(1, 30), 0.02, 600.0),
            pair("S", at(4, 0), 0.04, 1000.0),
            pair("S", at(7, 30), 0.0, 5000.0),
            pair("S", at(19, 29), 0.0, 7000.0),
        ];
        let bins = Binner::new(Duration::hours(6), thresholds()).bin(&pairs);

        // windows start at 01:30, 07:30 and 13:30; 19:29 still belongs to the 13:30 window
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].bin_start, at(1, 30));
        assert_eq!(bins[0].bin_mid, at(4, 30));
        assert_eq!(bins[0].pair_count, 2);
        assert!((bins[0].mean_predicted_lwc - 0.03).abs() < 1e-12);
        assert_eq!(bins[0].mean_visibility_m, 800.0);
        assert!(bins[0].obs_fog && bins[0].pred_fog);

        assert_eq!(bins[1].bin_start, at(7, 30));
        assert_eq!(bins[2].bin_start, at(13, 30));
        assert!(!bins[2].obs_fog && !bins[2].pred_fog);
    }

    #[test]
    fn test_empty_windows_are_dropped() {
        let pairs = vec![pair("S", at(0, 0), 0.0, 100.0), pair("S", at(23, 0), 0.0, 100.0)];
        let bins = Binner::new(Duration::hours(1), thresholds()).bin(&pairs);
        assert_eq!(bins.len(), 2);
        assert!(bins.iter().all(|b| b.pair_count > 0));
        assert_eq!(bins[1].bin_start, at(23, 0));
    }

    #[test]
    fn test_stations_binned_independently() {
        let pairs = vec![
            pair("B", at(5, 0), 0.0, 100.0),
            pair("A", at(0, 0), 0.0, 100.0),
            pair("A", at(5, 0), 0.0, 100.0),
        ];
        let bins = Binner::new(Duration::hours(6), thresholds()).bin(&pairs);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].station, "A");
        assert_eq!(bins[0].pair_count, 2);
        assert_eq!(bins[1].station, "B");
        assert_eq!(bins[1].bin_start, at(5, 0));
    }

    #[test]
    fn test_labels_are_independent() {
        let pairs = vec![pair("S", at(0, 0), 0.02, 5000.0)];
        let bins = Binner::new(Duration::hours(6), thresholds()).bin(&pairs);
        assert!(bins[0].pred_fog);
        assert!(!bins[0].obs_fog);
    }

    #[test]
    fn test_no_pairs_no_bins() {
        assert!(Binner::new(Duration::hours(6), thresholds()).bin(&[]).is_empty());
    }
}
