//! Assigns every station the set of grid cells that represent it on one model grid.

use crate::spatial::error::SpatialError;
use crate::spatial::grid_index::GridIndex;
use crate::types::station::Station;
use log::debug;
use std::collections::HashMap;

/// The grid cells representing one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationCells {
    pub station: Station,
    /// Flat grid cell ids. Never empty.
    pub cells: Vec<usize>,
    /// `true` when no cell was inside the search radius and the nearest one was used.
    pub nearest_fallback: bool,
}

/// Station → grid cell relation for one grid, in station registry order.
#[derive(Debug, Clone, Default)]
pub struct StationMapping {
    entries: Vec<StationCells>,
    by_name: HashMap<String, usize>,
}

impl StationMapping {
    /// Maps every station onto `index`.
    ///
    /// Cells within `radius_km` of the station are used; if there are none, the single
    /// nearest cell is used instead, so every station ends up with at least one cell.
    pub fn build(
        index: &GridIndex,
        stations: &[Station],
        radius_km: f64,
    ) -> Result<Self, SpatialError> {
        if index.is_empty() {
            return Err(SpatialError::EmptyGrid);
        }
        let mut entries = Vec::with_capacity(stations.len());
        for station in stations {
            let mut cells: Vec<usize> = index
                .within_radius(station.location(), radius_km)?
                .into_iter()
                .map(|(point, _)| point.id)
                .collect();
            cells.sort_unstable();

            let nearest_fallback = cells.is_empty();
            if nearest_fallback {
                let (point, dist_km) = index
                    .nearest(station.location())
                    .ok_or(SpatialError::EmptyGrid)?;
                debug!(
                    "No grid cell within {} km of station {}, using nearest cell {} at {:.2} km",
                    radius_km, station.name, point.id, dist_km
                );
                cells.push(point.id);
            }

            entries.push(StationCells {
                station: station.clone(),
                cells,
                nearest_fallback,
            });
        }

        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.station.name.clone(), i))
            .collect();
        Ok(Self { entries, by_name })
    }

    pub fn get(&self, station: &str) -> Option<&StationCells> {
        self.by_name.get(station).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[StationCells] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::grid::GridGeometry;

    fn index() -> GridIndex {
        let lats: Vec<f64> = (0..20).map(|i| 43.0 + 0.02 * i as f64).collect();
        let lons: Vec<f64> = (0..20).map(|i| -9.0 + 0.02 * i as f64).collect();
        GridIndex::new(&GridGeometry::from_axes(&lats, &lons).unwrap()).unwrap()
    }

    #[test]
    fn test_every_station_maps_to_at_least_one_cell() {
        let stations = vec![
            Station::new("inside", 43.1, -8.8),
            Station::new("far_away", 40.0, -3.0),
            Station::new("edge", 43.38, -8.62),
        ];
        let mapping = StationMapping::build(&index(), &stations, 2.0).unwrap();

        assert_eq!(mapping.len(), 3);
        for entry in mapping.entries() {
            assert!(!entry.cells.is_empty(), "{} is unmapped", entry.station.name);
        }

        let inside = mapping.get("inside").unwrap();
        assert!(!inside.nearest_fallback);
        assert!(inside.cells.len() > 1);

        let far = mapping.get("far_away").unwrap();
        assert!(far.nearest_fallback);
        assert_eq!(far.cells.len(), 1);
    }

    #[test]
    fn test_fallback_picks_nearest_cell() {
        let geometry = GridGeometry::from_axes(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let index = GridIndex::new(&geometry).unwrap();
        let stations = vec![Station::new("s", 0.9, 0.8)];
        let mapping = StationMapping::build(&index, &stations, 1.0).unwrap();
        // (1.0, 1.0) is id 3
        assert_eq!(mapping.get("s").unwrap().cells, vec![3]);
    }

    #[test]
    fn test_unknown_station_lookup() {
        let mapping = StationMapping::build(&index(), &[], 2.0).unwrap();
        assert!(mapping.is_empty());
        assert!(mapping.get("nope").is_none());
    }
}
