//! Lazy, load-once shelter catalog loader.
//!
//! # Responsibility
//! - Fetch every configured dataset on first demand and merge them.
//! - Cache the merged catalog for the rest of the session.
//!
//! # Invariants
//! - A ready catalog is never refreshed or invalidated.
//! - Any fetch/parse failure leaves no partial catalog behind.
//! - Failure is reported as `CatalogState::Failed`, never as an empty
//!   `Ready` catalog.

use super::dataset::parse_shelter_dataset;
use super::source::DatasetSource;
use super::ShelterCatalog;
use crate::model::shelter::Shelter;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::time::Instant;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One dataset to merge into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatasetSpec {
    /// Short stable name used in logs, e.g. `new_taipei`.
    pub name: String,
    /// Location handed to the `DatasetSource`.
    pub location: String,
}

impl DatasetSpec {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Catalog load error for one dataset.
#[derive(Debug)]
pub enum CatalogError {
    Fetch { dataset: String, source: io::Error },
    Parse {
        dataset: String,
        source: serde_json::Error,
    },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch { dataset, source } => {
                write!(f, "failed to fetch shelter dataset `{dataset}`: {source}")
            }
            Self::Parse { dataset, source } => {
                write!(f, "failed to parse shelter dataset `{dataset}`: {source}")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Observable availability of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    Ready(ShelterCatalog),
    /// Last attempt failed; message is the rendered error.
    Failed(String),
}

impl CatalogState {
    pub fn catalog(&self) -> Option<&ShelterCatalog> {
        match self {
            Self::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Loads and caches the merged catalog.
pub struct ShelterCatalogLoader<S: DatasetSource> {
    source: S,
    datasets: Vec<DatasetSpec>,
    state: CatalogState,
    loads: u64,
}

impl<S: DatasetSource> ShelterCatalogLoader<S> {
    pub fn new(source: S, datasets: Vec<DatasetSpec>) -> Self {
        Self {
            source,
            datasets,
            state: CatalogState::NotLoaded,
            loads: 0,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn catalog(&self) -> Option<&ShelterCatalog> {
        self.state.catalog()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Loads the catalog unless it is already ready.
    ///
    /// A previous failure is retried, matching the "empty means not yet
    /// available" contract. Returns the resulting state.
    pub fn ensure_loaded(&mut self) -> &CatalogState {
        if self.state.is_ready() {
            return &self.state;
        }

        let started_at = Instant::now();
        info!(
            "event=catalog_load module=catalog status=start datasets={}",
            self.datasets.len()
        );
        self.state = match self.fetch_all() {
            Ok(shelters) => {
                self.loads += 1;
                info!(
                    "event=catalog_load module=catalog status=ok shelters={} duration_ms={}",
                    shelters.len(),
                    started_at.elapsed().as_millis()
                );
                CatalogState::Ready(ShelterCatalog::new(self.loads, shelters))
            }
            Err(err) => {
                error!(
                    "event=catalog_load module=catalog status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                CatalogState::Failed(err.to_string())
            }
        };
        &self.state
    }

    fn fetch_all(&self) -> CatalogResult<Vec<Shelter>> {
        let mut bodies = Vec::with_capacity(self.datasets.len());
        for dataset in &self.datasets {
            let body = self
                .source
                .fetch(&dataset.location)
                .map_err(|source| CatalogError::Fetch {
                    dataset: dataset.name.clone(),
                    source,
                })?;
            bodies.push((dataset, body));
        }

        let mut merged = Vec::new();
        for (dataset, body) in bodies {
            let shelters =
                parse_shelter_dataset(&body).map_err(|source| CatalogError::Parse {
                    dataset: dataset.name.clone(),
                    source,
                })?;
            merged.extend(shelters);
        }
        Ok(merged)
    }
}
