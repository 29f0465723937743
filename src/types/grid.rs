//! Grid geometry of one model output file and the grid point type that is stored in
//! the spatial index. Includes the implementations necessary for spatial indexing
//! using the `rstar` crate.

use crate::spatial::error::SpatialError;
use crate::types::station::normalize_longitude;
use rstar::{PointDistance, RTreeObject, AABB};

/// One cell of a model grid.
///
/// The `id` is the flat index `row * ncols + col` into the 2-D grid and is stable for
/// the lifetime of the grid it was built from. Longitudes are stored normalised to
/// `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Treat a `GridPoint` as a degenerate bounding box in `[lat, lon]` space.
impl RTreeObject for GridPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

/// Squared Euclidean distance in degree space.
///
/// This is only used by the R-tree to order candidates; the exact great-circle distance
/// is computed afterwards with the `haversine` crate.
impl PointDistance for GridPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}

/// Latitude/longitude layout of a model grid with `nrows * ncols` cells.
///
/// Coordinates are stored as full row-major 2-D arrays regardless of whether the source
/// file shipped 1-D axes or curvilinear 2-D arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    nrows: usize,
    ncols: usize,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl GridGeometry {
    /// Builds the geometry of a regular grid from its 1-D latitude (rows) and longitude
    /// (columns) axes.
    pub fn from_axes(latitudes: &[f64], longitudes: &[f64]) -> Result<Self, SpatialError> {
        if latitudes.is_empty() || longitudes.is_empty() {
            return Err(SpatialError::EmptyGrid);
        }
        let nrows = latitudes.len();
        let ncols = longitudes.len();
        let mut lat_mesh = Vec::with_capacity(nrows * ncols);
        let mut lon_mesh = Vec::with_capacity(nrows * ncols);
        for &lat in latitudes {
            for &lon in longitudes {
                lat_mesh.push(lat);
                lon_mesh.push(lon);
            }
        }
        Ok(Self {
            nrows,
            ncols,
            latitudes: lat_mesh,
            longitudes: lon_mesh,
        })
    }

    /// Builds the geometry of a curvilinear grid from row-major 2-D coordinate arrays.
    pub fn from_mesh(
        nrows: usize,
        ncols: usize,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    ) -> Result<Self, SpatialError> {
        let expected = nrows * ncols;
        if expected == 0 {
            return Err(SpatialError::EmptyGrid);
        }
        for found in [latitudes.len(), longitudes.len()] {
            if found != expected {
                return Err(SpatialError::ShapeMismatch {
                    nrows,
                    ncols,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            nrows,
            ncols,
            latitudes,
            longitudes,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of cells in the grid.
    pub fn len(&self) -> usize {
        self.nrows * self.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts a flat cell id back into `(row, col)`.
    pub fn row_col(&self, id: usize) -> (usize, usize) {
        (id / self.ncols, id % self.ncols)
    }

    /// All grid cells as index-ready points, in id order.
    pub fn points(&self) -> Vec<GridPoint> {
        self.latitudes
            .iter()
            .zip(&self.longitudes)
            .enumerate()
            .map(|(id, (&latitude, &longitude))| GridPoint {
                id,
                latitude,
                longitude: normalize_longitude(longitude),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_axes_builds_row_major_ids() {
        let geometry = GridGeometry::from_axes(&[42.0, 43.0], &[-9.0, -8.0, -7.0]).unwrap();
        assert_eq!(geometry.len(), 6);
        let points = geometry.points();
        // id 4 is row 1, col 1
        assert_eq!(points[4].latitude, 43.0);
        assert_eq!(points[4].longitude, -8.0);
        assert_eq!(geometry.row_col(4), (1, 1));
    }

    #[test]
    fn test_from_mesh_rejects_bad_shape() {
        let result = GridGeometry::from_mesh(2, 2, vec![0.0; 4], vec![0.0; 3]);
        assert!(matches!(
            result,
            Err(SpatialError::ShapeMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_empty_axes_rejected() {
        assert!(matches!(
            GridGeometry::from_axes(&[], &[1.0]),
            Err(SpatialError::EmptyGrid)
        ));
    }

    #[test]
    fn test_points_normalize_longitude() {
        let geometry = GridGeometry::from_axes(&[0.0], &[350.0]).unwrap();
        assert_eq!(geometry.points()[0].longitude, -10.0);
    }
}
