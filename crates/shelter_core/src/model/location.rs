//! Geographic point in raw WGS84 degrees.

use serde::{Deserialize, Serialize};

/// `[longitude, latitude]` pair, serialized as a two-element array to match
/// GeoJSON point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Euclidean distance in raw degree units.
    ///
    /// Not geodesic: one degree of longitude is treated the same as one
    /// degree of latitude.
    pub fn degree_distance(&self, other: &LngLat) -> f64 {
        (self.lng - other.lng).hypot(self.lat - other.lat)
    }

    /// Returns whether both components are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}
