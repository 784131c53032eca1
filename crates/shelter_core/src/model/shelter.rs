//! Shelter and rendezvous selection model.
//!
//! # Invariants
//! - `address` is the de-facto key of a shelter within one catalog.
//! - `CommonShelter` is always derived from a catalog `Shelter`.

use super::location::LngLat;
use serde::{Deserialize, Serialize};

/// One evacuation shelter point from a municipality dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    /// Category label shown as the shelter title.
    pub category: String,
    pub address: String,
    pub village: Option<String>,
    /// Number of people the shelter can hold, when the dataset states it.
    pub capacity: Option<u32>,
    /// Dataset serial number.
    pub serial: Option<String>,
    pub basement_floors: Option<String>,
    /// Responsible police precinct.
    pub police_station: Option<String>,
    pub coordinates: LngLat,
}

impl Shelter {
    /// Reduces this shelter to the fields kept for the household rendezvous.
    pub fn to_common_shelter(&self) -> CommonShelter {
        CommonShelter {
            address: self.address.clone(),
            coordinates: self.coordinates,
            name: if self.category.trim().is_empty() {
                None
            } else {
                Some(self.category.clone())
            },
        }
    }
}

/// The household's designated rendezvous shelter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonShelter {
    pub address: String,
    pub coordinates: LngLat,
    pub name: Option<String>,
}

impl CommonShelter {
    /// Display label with the fallback used when the category is missing.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Selected shelter")
    }
}

#[cfg(test)]
mod tests {
    use super::Shelter;
    use crate::model::location::LngLat;

    fn shelter(category: &str) -> Shelter {
        Shelter {
            category: category.to_string(),
            address: "No. 1, Zhongshan Rd".to_string(),
            village: None,
            capacity: Some(120),
            serial: None,
            basement_floors: None,
            police_station: None,
            coordinates: LngLat::new(121.5, 25.0),
        }
    }

    #[test]
    fn common_shelter_keeps_address_coordinates_and_category() {
        let common = shelter("Air-raid shelter").to_common_shelter();
        assert_eq!(common.address, "No. 1, Zhongshan Rd");
        assert_eq!(common.coordinates, LngLat::new(121.5, 25.0));
        assert_eq!(common.display_name(), "Air-raid shelter");
    }

    #[test]
    fn blank_category_falls_back_to_generic_label() {
        let common = shelter("  ").to_common_shelter();
        assert_eq!(common.name, None);
        assert_eq!(common.display_name(), "Selected shelter");
    }
}
