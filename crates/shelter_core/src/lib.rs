//! Core domain logic for the family shelter map.
//! This crate is the single source of truth for household, catalog and
//! map reconciliation invariants.

pub mod catalog;
pub mod config;
pub mod contacts;
pub mod db;
pub mod logging;
pub mod map;
pub mod model;
pub mod prefs;
pub mod proximity;
pub mod service;
pub mod store;

pub use catalog::loader::{CatalogError, CatalogState, DatasetSpec, ShelterCatalogLoader};
pub use catalog::search::{search_shelters, SearchHit};
pub use catalog::source::{DatasetSource, FsDatasetSource, MemoryDatasetSource};
pub use catalog::ShelterCatalog;
pub use config::{AppConfig, ConfigError, MapConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use map::event::{MapEvent, PopupAction};
pub use map::view::{MapInputs, ReconcileReport, ShelterMapView};
pub use map::widget::{MapCommand, MapCommandBuffer, MapWidget};
pub use model::location::LngLat;
pub use model::member::{Member, MemberDraft, MemberId, MemberPatch};
pub use model::shelter::{CommonShelter, Shelter};
pub use prefs::{MemoryPreferenceStore, PreferenceStore, PrefsError, SqlitePreferenceStore};
pub use proximity::{ProximityMatcher, ProximityStatus};
pub use service::session::ShelterSession;
pub use store::family_store::{FamilyEvent, FamilyStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
