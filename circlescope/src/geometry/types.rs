//! Geometry primitives shared across the library.

use thiserror::Error;

/// A geographic position as longitude/latitude in decimal degrees.
///
/// Stored lon-first to match the GeoJSON coordinate order used by every
/// service this library talks to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    /// Create a new position from longitude and latitude in degrees.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl std::fmt::Display for LonLat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Compute the bounding box of a ring or line.
    ///
    /// Returns `None` for an empty coordinate sequence.
    pub fn from_coords(coords: &[LonLat]) -> Option<Self> {
        let first = coords.first()?;
        let mut bbox = Self {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for c in &coords[1..] {
            bbox.min_lon = bbox.min_lon.min(c.lon);
            bbox.min_lat = bbox.min_lat.min(c.lat);
            bbox.max_lon = bbox.max_lon.max(c.lon);
            bbox.max_lat = bbox.max_lat.max(c.lat);
        }
        Some(bbox)
    }

    /// Check whether a position lies inside or on the box boundary.
    pub fn contains(&self, p: LonLat) -> bool {
        p.lon >= self.min_lon
            && p.lon <= self.max_lon
            && p.lat >= self.min_lat
            && p.lat <= self.max_lat
    }
}

/// Errors that can occur while building geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Radius must be a positive, finite number of meters.
    #[error("invalid circle radius: {0} m")]
    InvalidRadius(f64),
    /// At least 3 sample points are needed to close a ring.
    #[error("invalid step count for circle ring: {0}")]
    InvalidSteps(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_coords() {
        let coords = vec![
            LonLat::new(27.0, 39.6),
            LonLat::new(27.1, 39.5),
            LonLat::new(26.9, 39.7),
        ];
        let bbox = BoundingBox::from_coords(&coords).unwrap();
        assert_eq!(bbox.min_lon, 26.9);
        assert_eq!(bbox.max_lon, 27.1);
        assert_eq!(bbox.min_lat, 39.5);
        assert_eq!(bbox.max_lat, 39.7);
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(BoundingBox::from_coords(&[]).is_none());
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox {
            min_lon: 0.0,
            min_lat: 0.0,
            max_lon: 1.0,
            max_lat: 1.0,
        };
        assert!(bbox.contains(LonLat::new(0.5, 0.5)));
        assert!(bbox.contains(LonLat::new(0.0, 1.0)));
        assert!(!bbox.contains(LonLat::new(1.5, 0.5)));
    }
}
