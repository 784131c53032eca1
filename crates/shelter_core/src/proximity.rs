//! "Is this member at a shelter" classification.
//!
//! # Responsibility
//! - Match a coordinate against the catalog with a fixed degree threshold.
//!
//! # Invariants
//! - Distance is Euclidean over raw degrees; longitude is not scaled by
//!   latitude.
//! - The first catalog entry strictly inside the threshold wins.
//! - An empty or unavailable catalog always yields `Outside`.

use crate::catalog::ShelterCatalog;
use crate::model::location::LngLat;
use crate::model::shelter::Shelter;

/// Default match radius in degrees (roughly 10 m north-south in Taipei).
pub const DEFAULT_PROXIMITY_THRESHOLD_DEG: f64 = 0.0001;

/// Derived member status for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ProximityStatus {
    AtShelter {
        shelter_index: usize,
        address: String,
        name: String,
    },
    Outside,
}

impl ProximityStatus {
    /// Stable status string used in map feature properties.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtShelter { .. } => "at_shelter",
            Self::Outside => "outside",
        }
    }

    pub fn is_at_shelter(&self) -> bool {
        matches!(self, Self::AtShelter { .. })
    }
}

/// Linear-scan proximity matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityMatcher {
    threshold_deg: f64,
}

impl Default for ProximityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD_DEG)
    }
}

impl ProximityMatcher {
    pub fn new(threshold_deg: f64) -> Self {
        Self { threshold_deg }
    }

    pub fn threshold_deg(&self) -> f64 {
        self.threshold_deg
    }

    /// Returns the first shelter strictly within the threshold of `at`.
    pub fn find_shelter<'a>(&self, at: LngLat, shelters: &'a [Shelter]) -> Option<(usize, &'a Shelter)> {
        shelters
            .iter()
            .enumerate()
            .find(|(_, shelter)| shelter.coordinates.degree_distance(&at) < self.threshold_deg)
    }

    /// Classifies `at` against an optional catalog.
    pub fn status(&self, at: LngLat, catalog: Option<&ShelterCatalog>) -> ProximityStatus {
        let Some(catalog) = catalog else {
            return ProximityStatus::Outside;
        };
        match self.find_shelter(at, catalog.shelters()) {
            Some((shelter_index, shelter)) => ProximityStatus::AtShelter {
                shelter_index,
                address: shelter.address.clone(),
                name: shelter.category.clone(),
            },
            None => ProximityStatus::Outside,
        }
    }
}
