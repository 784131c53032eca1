//! Shelter catalog: loading, lookup, partitioning and search.
//!
//! # Responsibility
//! - Merge the municipality datasets into one immutable collection.
//! - Answer address lookups and render partitions for the map view.
//!
//! # Invariants
//! - A catalog is never mutated after load; a new load yields a new
//!   generation.
//! - Partitioning never drops or duplicates an entry.

pub mod dataset;
pub mod loader;
pub mod search;
pub mod source;

use crate::model::shelter::Shelter;

/// Merged, immutable shelter collection for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelterCatalog {
    generation: u64,
    shelters: Vec<Shelter>,
}

/// Render split of a catalog around the selected common shelter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterPartition {
    /// Catalog indices rendered in the clustered source.
    pub clustered: Vec<usize>,
    /// Catalog index rendered as the highlighted common shelter.
    pub highlighted: Option<usize>,
}

impl ShelterCatalog {
    pub fn new(generation: u64, shelters: Vec<Shelter>) -> Self {
        Self {
            generation,
            shelters,
        }
    }

    /// Load counter value this catalog was produced under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn shelters(&self) -> &[Shelter] {
        &self.shelters
    }

    pub fn len(&self) -> usize {
        self.shelters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shelters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Shelter> {
        self.shelters.get(index)
    }

    /// Index of the first shelter whose address equals `address` exactly.
    pub fn position_by_address(&self, address: &str) -> Option<usize> {
        self.shelters
            .iter()
            .position(|shelter| shelter.address == address)
    }

    pub fn find_by_address(&self, address: &str) -> Option<&Shelter> {
        self.position_by_address(address)
            .and_then(|index| self.shelters.get(index))
    }

    /// Splits the catalog into clustered points and the highlighted point.
    ///
    /// Only the first entry matching `selected_address` is highlighted; any
    /// later entry sharing that address stays clustered.
    pub fn partition(&self, selected_address: Option<&str>) -> ShelterPartition {
        let highlighted = selected_address.and_then(|address| self.position_by_address(address));
        let clustered = (0..self.shelters.len())
            .filter(|index| Some(*index) != highlighted)
            .collect();
        ShelterPartition {
            clustered,
            highlighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ShelterCatalog;
    use crate::model::location::LngLat;
    use crate::model::shelter::Shelter;

    fn shelter(address: &str) -> Shelter {
        Shelter {
            category: "Shelter".to_string(),
            address: address.to_string(),
            village: None,
            capacity: None,
            serial: None,
            basement_floors: None,
            police_station: None,
            coordinates: LngLat::new(121.5, 25.0),
        }
    }

    #[test]
    fn partition_without_selection_clusters_everything() {
        let catalog = ShelterCatalog::new(1, vec![shelter("A"), shelter("B")]);
        let partition = catalog.partition(None);
        assert_eq!(partition.clustered, vec![0, 1]);
        assert_eq!(partition.highlighted, None);
    }

    #[test]
    fn partition_with_unknown_address_highlights_nothing() {
        let catalog = ShelterCatalog::new(1, vec![shelter("A"), shelter("B")]);
        let partition = catalog.partition(Some("Z"));
        assert_eq!(partition.clustered, vec![0, 1]);
        assert_eq!(partition.highlighted, None);
    }

    #[test]
    fn duplicate_addresses_keep_later_entries_clustered() {
        let catalog = ShelterCatalog::new(1, vec![shelter("A"), shelter("B"), shelter("B")]);
        let partition = catalog.partition(Some("B"));
        assert_eq!(partition.highlighted, Some(1));
        assert_eq!(partition.clustered, vec![0, 2]);
    }
}
