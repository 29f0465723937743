//! Defines the observing station registry entry and the geographic coordinate helpers
//! shared by the spatial index and the station mapper.

use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use fogverify::LatLon;
///
/// let coruna = LatLon(43.30, -8.38);
/// assert_eq!(coruna.0, 43.30);
/// assert_eq!(coruna.1, -8.38);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Returns the same point with its longitude wrapped into `[-180, 180)`.
    ///
    /// Model grids are frequently published on a `0..360` longitude axis while station
    /// registries use signed longitudes; everything that enters the spatial index goes
    /// through this first.
    pub fn normalized(self) -> Self {
        LatLon(self.0, normalize_longitude(self.1))
    }
}

/// Wraps a longitude in degrees into `[-180, 180)`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// A single visibility-observing station from the station registry.
///
/// Stations are loaded once per run and shared read-only between every grid that is
/// processed. The `name` is the station's identity and must be unique in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station name (e.g. "LECO" or an ISD identifier such as "08001099999").
    pub name: String,
    /// Latitude in decimal degrees (positive for North).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East).
    pub longitude: f64,
}

impl Station {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(350.0), -10.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(-8.5), -8.5);
    }

    #[test]
    fn test_station_location() {
        let station = Station::new("LEST", 42.89, -8.41);
        assert_eq!(station.location(), LatLon(42.89, -8.41));
        assert_eq!(LatLon(42.89, 351.59).normalized().1.round(), -8.0);
    }
}
