//! Geographic value types: [`Coordinate`] and [`BoundingRegion`].
//!
//! Distances between coordinates are great-circle (haversine) distances in
//! meters. Every component that measures proximity goes through
//! [`haversine_distance`] so nearest-node resolution, A* heuristics and edge
//! lengths share one scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default margin added around the start/end pair when fetching a graph (~5km).
pub const DEFAULT_BUFFER_DEG: f64 = 0.05;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90,90] x [-180,180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to another coordinate in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_distance(self, other)
    }

    /// Position on the unit sphere. Chord length between two such points grows
    /// monotonically with great-circle distance.
    pub fn to_unit_vector(&self) -> [f64; 3] {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    /// Parse free text of the form `"lat, lon"`.
    fn from_str(input: &str) -> Result<Self> {
        let parse_error = |reason: &str| Error::CoordinateParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(parse_error(&format!(
                "expected 2 comma-separated values, found {}",
                parts.len()
            )));
        }

        let mut values = [0.0_f64; 2];
        for (slot, (label, raw)) in values
            .iter_mut()
            .zip([("latitude", parts[0]), ("longitude", parts[1])])
        {
            if raw.is_empty() {
                return Err(parse_error(&format!("{label} is missing")));
            }
            *slot = raw
                .parse::<f64>()
                .map_err(|_| parse_error(&format!("{label} '{raw}' is not a number")))?;
        }

        Coordinate::new(values[0], values[1])
    }
}

/// Rectangular lat/lon extent used to scope a graph fetch.
///
/// Invariant: `north >= south` and `east >= west`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingRegion {
    /// Smallest region containing both coordinates, padded by `buffer` degrees.
    ///
    /// The padded bounds are clamped to valid latitude and longitude. Regions
    /// are never wrapped across the antimeridian.
    pub fn around(a: &Coordinate, b: &Coordinate, buffer: f64) -> Self {
        let buffer = buffer.abs();
        Self {
            north: (a.latitude.max(b.latitude) + buffer).min(90.0),
            south: (a.latitude.min(b.latitude) - buffer).max(-90.0),
            east: (a.longitude.max(b.longitude) + buffer).min(180.0),
            west: (a.longitude.min(b.longitude) - buffer).max(-180.0),
        }
    }

    /// Whether the coordinate lies inside the region (edges inclusive).
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south..=self.north).contains(&coordinate.latitude)
            && (self.west..=self.east).contains(&coordinate.longitude)
    }

    /// Stable key used by graph caches.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.4}_{:.4}_{:.4}_{:.4}",
            self.south, self.west, self.north, self.east
        )
    }
}

impl fmt::Display for BoundingRegion {
    /// Renders as `south,west,north,east`, the order Overpass expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Haversine distance between two coordinates in meters.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pair() {
        let coordinate: Coordinate = "26.9050, 70.9200".parse().unwrap();
        assert_eq!(coordinate.latitude, 26.905);
        assert_eq!(coordinate.longitude, 70.92);
    }

    #[test]
    fn rejects_missing_longitude() {
        let err = "26.9, ".parse::<Coordinate>().unwrap_err();
        assert!(matches!(err, Error::CoordinateParse { .. }));
        assert!(err.to_string().contains("longitude is missing"));
    }

    #[test]
    fn rejects_wrong_component_count() {
        for input in ["26.9", "1, 2, 3", ""] {
            let err = input.parse::<Coordinate>().unwrap_err();
            assert!(
                matches!(err, Error::CoordinateParse { .. }),
                "{input:?} gave {err}"
            );
        }
    }

    #[test]
    fn rejects_non_numeric_component() {
        let err = "north, 70.0".parse::<Coordinate>().unwrap_err();
        assert!(err.to_string().contains("latitude 'north' is not a number"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = "91.0, 10.0".parse::<Coordinate>().unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinate { .. }));
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn region_pads_both_points() {
        let a = Coordinate::new(26.95, 70.00).unwrap();
        let b = Coordinate::new(26.90, 70.05).unwrap();
        let region = BoundingRegion::around(&a, &b, DEFAULT_BUFFER_DEG);

        assert!((region.north - 27.00).abs() < 1e-9);
        assert!((region.south - 26.85).abs() < 1e-9);
        assert!((region.east - 70.10).abs() < 1e-9);
        assert!((region.west - 69.95).abs() < 1e-9);
        assert!(region.contains(&a));
        assert!(region.contains(&b));
    }

    #[test]
    fn negative_buffer_keeps_invariant() {
        let a = Coordinate::new(10.0, 10.0).unwrap();
        let region = BoundingRegion::around(&a, &a, -0.1);
        assert!(region.north >= region.south);
        assert!(region.east >= region.west);
    }

    #[test]
    fn region_is_clamped_near_poles_and_antimeridian() {
        let a = Coordinate::new(89.98, 179.97).unwrap();
        let b = Coordinate::new(-89.99, -179.99).unwrap();
        let region = BoundingRegion::around(&a, &b, DEFAULT_BUFFER_DEG);
        assert_eq!(region.north, 90.0);
        assert_eq!(region.south, -90.0);
        assert_eq!(region.east, 180.0);
        assert_eq!(region.west, -180.0);
        assert!(region.contains(&a));
        assert!(region.contains(&b));
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude is ~111.2km.
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(1.0, 0.0).unwrap();
        let distance = haversine_distance(&a, &b);
        assert!((distance - 111_195.0).abs() < 10.0);
        assert_eq!(haversine_distance(&a, &a), 0.0);
    }
}
