use crate::spatial::error::SpatialError;
use crate::types::grid::{GridGeometry, GridPoint};
use crate::types::station::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};

/// Mean Earth radius used to turn a search radius in km into an angular radius.
/// The `haversine` crate uses the same value for `Units::Kilometers`.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Squared chord lengths this close are treated as the same distance when breaking
// nearest-cell ties.
const CHORD_TIE_EPS: f64 = 1e-18;

// Slack on the query envelope so points exactly on the radius survive float rounding.
const ENVELOPE_PAD_DEG: f64 = 1e-9;

/// Spatial index over the cells of one model grid.
///
/// Candidate cells are retrieved from an R-tree keyed on `[lat, lon]` degrees and then
/// filtered with the exact haversine distance, so radius queries behave like a
/// great-circle ball query.
///
/// Nearest-cell lookups use a second R-tree over unit vectors on the sphere. Chord
/// length grows monotonically with great-circle distance, so that search is exact near
/// the poles and on curvilinear grids.
#[derive(Debug, Clone)]
pub struct GridIndex {
    rtree: RTree<GridPoint>,
    sphere: RTree<GeomWithData<[f64; 3], GridPoint>>,
    len: usize,
}

impl GridIndex {
    pub fn new(geometry: &GridGeometry) -> Result<Self, SpatialError> {
        let points = geometry.points();
        if points.is_empty() {
            return Err(SpatialError::EmptyGrid);
        }
        let len = points.len();
        let on_sphere = points
            .iter()
            .map(|p| GeomWithData::new(unit_vector(p.latitude, p.longitude), *p))
            .collect();
        Ok(Self {
            rtree: RTree::bulk_load(points),
            sphere: RTree::bulk_load(on_sphere),
            len,
        })
    }

    /// Number of indexed grid cells.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All cells whose great-circle distance to `location` is at most `radius_km`,
    /// together with that distance. The order of the result is unspecified.
    pub fn within_radius(
        &self,
        location: LatLon,
        radius_km: f64,
    ) -> Result<Vec<(GridPoint, f64)>, SpatialError> {
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(SpatialError::InvalidRadius(radius_km));
        }
        let LatLon(latitude, longitude) = location.normalized();
        let angular_radius = radius_km / EARTH_RADIUS_KM;

        let matches = search_envelopes(latitude, longitude, angular_radius)
            .into_iter()
            .flat_map(|envelope| self.rtree.locate_in_envelope(&envelope))
            .filter_map(|point| {
                let dist_km = great_circle_km(latitude, longitude, point);
                (dist_km <= radius_km).then_some((*point, dist_km))
            })
            .collect();
        Ok(matches)
    }

    /// The cell closest to `location` along the great circle. Ties go to the lower id.
    pub fn nearest(&self, location: LatLon) -> Option<(GridPoint, f64)> {
        let LatLon(latitude, longitude) = location.normalized();
        let mut candidates = self
            .sphere
            .nearest_neighbor_iter_with_distance_2(&unit_vector(latitude, longitude));
        let (first, best_d2) = candidates.next()?;

        std::iter::once((first, best_d2))
            .chain(candidates.take_while(|&(_, d2)| d2 <= best_d2 + CHORD_TIE_EPS))
            .map(|(cell, _)| (cell.data, great_circle_km(latitude, longitude, &cell.data)))
            .min_by_key(|(point, dist_km)| (OrderedFloat(*dist_km), point.id))
    }
}

/// Position on the unit sphere, as `[x, y, z]`.
fn unit_vector(latitude: f64, longitude: f64) -> [f64; 3] {
    let (lat, lon) = (latitude.to_radians(), longitude.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn great_circle_km(latitude: f64, longitude: f64, point: &GridPoint) -> f64 {
    distance(
        HaversineLocation {
            latitude,
            longitude,
        },
        HaversineLocation {
            latitude: point.latitude,
            longitude: point.longitude,
        },
        Units::Kilometers,
    )
}

/// Degree-space boxes covering the spherical cap of `angular_radius` (radians) around
/// the point. Caps crossing the antimeridian are split in two boxes.
fn search_envelopes(latitude: f64, longitude: f64, angular_radius: f64) -> Vec<AABB<[f64; 2]>> {
    let radius_deg = angular_radius.to_degrees();
    let lat_lo = (latitude - radius_deg - ENVELOPE_PAD_DEG).max(-90.0);
    let lat_hi = (latitude + radius_deg + ENVELOPE_PAD_DEG).min(90.0);

    // Longitude half-width of a spherical cap; a cap touching a pole spans every longitude.
    let half_width = if latitude.abs() + radius_deg >= 90.0 {
        180.0
    } else {
        let ratio = angular_radius.sin() / latitude.to_radians().cos();
        ratio.clamp(-1.0, 1.0).asin().to_degrees() + ENVELOPE_PAD_DEG
    };

    if half_width >= 180.0 {
        return vec![AABB::from_corners([lat_lo, -180.0], [lat_hi, 180.0])];
    }

    let lon_lo = longitude - half_width;
    let lon_hi = longitude + half_width;
    if lon_lo < -180.0 {
        vec![
            AABB::from_corners([lat_lo, lon_lo + 360.0], [lat_hi, 180.0]),
            AABB::from_corners([lat_lo, -180.0], [lat_hi, lon_hi]),
        ]
    } else if lon_hi >= 180.0 {
        vec![
            AABB::from_corners([lat_lo, lon_lo], [lat_hi, 180.0]),
            AABB::from_corners([lat_lo, -180.0], [lat_hi, lon_hi - 360.0]),
        ]
    } else {
        vec![AABB::from_corners([lat_lo, lon_lo], [lat_hi, lon_hi])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_grid(lat0: f64, lon0: f64, step: f64, n: usize) -> GridGeometry {
        let lats: Vec<f64> = (0..n).map(|i| lat0 + step * i as f64).collect();
        let lons: Vec<f64> = (0..n).map(|i| lon0 + step * i as f64).collect();
        GridGeometry::from_axes(&lats, &lons).unwrap()
    }

    #[test]
    fn test_within_radius_matches_brute_force() {
        let geometry = regular_grid(42.0, -9.0, 0.01, 60);
        let index = GridIndex::new(&geometry).unwrap();
        let station = LatLon(42.3, -8.7);
        let radius_km = 4.0;

        let mut found: Vec<usize> = index
            .within_radius(station, radius_km)
            .unwrap()
            .into_iter()
            .map(|(p, _)| p.id)
            .collect();
        found.sort_unstable();

        let expected: Vec<usize> = geometry
            .points()
            .iter()
            .filter(|p| great_circle_km(station.0, station.1, p) <= radius_km)
            .map(|p| p.id)
            .collect();

        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_within_radius_can_be_empty() {
        let index = GridIndex::new(&regular_grid(0.0, 0.0, 1.0, 5)).unwrap();
        let found = index.within_radius(LatLon(0.5, 0.5), 1.0).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_within_radius_rejects_bad_radius() {
        let index = GridIndex::new(&regular_grid(0.0, 0.0, 1.0, 2)).unwrap();
        assert!(matches!(
            index.within_radius(LatLon(0.0, 0.0), 0.0),
            Err(SpatialError::InvalidRadius(_))
        ));
        assert!(index.within_radius(LatLon(0.0, 0.0), f64::NAN).is_err());
    }

    #[test]
    fn test_radius_query_across_antimeridian() {
        let geometry = GridGeometry::from_axes(&[10.0], &[179.99, -179.99, 0.0]).unwrap();
        let index = GridIndex::new(&geometry).unwrap();
        let mut ids: Vec<usize> = index
            .within_radius(LatLon(10.0, 180.0), 5.0)
            .unwrap()
            .into_iter()
            .map(|(p, _)| p.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_grid_on_0_360_axis() {
        // -8.5 E is 351.5 on a 0..360 axis
        let geometry = GridGeometry::from_axes(&[43.0], &[351.5, 352.0]).unwrap();
        let index = GridIndex::new(&geometry).unwrap();
        let found = index.within_radius(LatLon(43.0, -8.5), 1.0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.id, 0);
    }

    #[test]
    fn test_nearest() {
        let index = GridIndex::new(&regular_grid(40.0, -5.0, 1.0, 4)).unwrap();
        let (point, dist_km) = index.nearest(LatLon(41.2, -3.9)).unwrap();
        assert_eq!((point.latitude, point.longitude), (41.0, -4.0));
        assert!(dist_km < 30.0);
    }

    #[test]
    fn test_nearest_across_antimeridian() {
        let geometry = GridGeometry::from_axes(&[0.0], &[-179.5, 170.0]).unwrap();
        let index = GridIndex::new(&geometry).unwrap();
        let (point, _) = index.nearest(LatLon(0.0, 179.8)).unwrap();
        assert_eq!(point.id, 0);
    }

    #[test]
    fn test_nearest_near_pole() {
        // In degree space (88.5, -100) is closest to the first cell, but across the pole
        // the second one is only a few km away.
        let geometry = GridGeometry::from_mesh(1, 2, vec![88.0, 89.9], vec![-100.0, 80.0]).unwrap();
        let index = GridIndex::new(&geometry).unwrap();
        let (point, dist_km) = index.nearest(LatLon(89.9, -100.0)).unwrap();
        assert_eq!(point.id, 1);
        assert!(dist_km < 25.0);
    }

    #[test]
    fn test_nearest_matches_brute_force_at_high_latitude() {
        let lats: Vec<f64> = (0..12).map(|i| 80.0 + i as f64 * 0.8).collect();
        let lons: Vec<f64> = (0..36).map(|j| -180.0 + j as f64 * 10.0).collect();
        let geometry = GridGeometry::from_axes(&lats, &lons).unwrap();
        let index = GridIndex::new(&geometry).unwrap();

        for station in [LatLon(88.7, 23.0), LatLon(89.5, -171.0), LatLon(85.1, 95.0)] {
            let expected = geometry
                .points()
                .iter()
                .map(|p| great_circle_km(station.0, station.1, p))
                .fold(f64::INFINITY, f64::min);
            let (_, found) = index.nearest(station).unwrap();
            assert!((found - expected).abs() < 1e-9, "{station:?}: {found} vs {expected}");
        }
    }
}
