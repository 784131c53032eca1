//! Runtime configuration for the shelter client core.
//!
//! # Responsibility
//! - Provide defaults matching the bundled Taipei / New Taipei datasets.
//! - Load JSON overrides from a file, optionally located via env var.
//!
//! # Invariants
//! - Every field has a default; a partial file only overrides what it names.
//! - `validate()` runs on every load path before a config is handed out.

use crate::catalog::loader::DatasetSpec;
use crate::model::location::LngLat;
use crate::proximity::DEFAULT_PROXIMITY_THRESHOLD_DEG;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Env var pointing at a JSON config file.
pub const CONFIG_ENV_VAR: &str = "SHELTER_CONFIG";

/// Map camera and clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: LngLat,
    pub zoom: f64,
    /// Zoom used when flying to a newly selected common shelter.
    pub selection_zoom: f64,
    pub cluster_max_zoom: u8,
    pub cluster_radius: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LngLat::new(121.4685, 25.0458),
            zoom: 11.0,
            selection_zoom: 15.0,
            cluster_max_zoom: 14,
            cluster_radius: 50,
        }
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Static web root that dataset and contact locations resolve against.
    pub data_dir: PathBuf,
    pub datasets: Vec<DatasetSpec>,
    pub contacts_location: String,
    /// Directory avatar refs resolve against; `None` uses `data_dir`.
    pub avatar_dir: Option<PathBuf>,
    /// Preferences database; `None` keeps preferences in memory.
    pub db_path: Option<PathBuf>,
    pub proximity_threshold_deg: f64,
    pub map: MapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("public"),
            datasets: vec![
                DatasetSpec::new("new_taipei", "json/新北市.json"),
                DatasetSpec::new("taipei", "json/臺北市.json"),
            ],
            contacts_location: "emergency-contacts.json".to_string(),
            avatar_dir: None,
            db_path: None,
            proximity_threshold_deg: DEFAULT_PROXIMITY_THRESHOLD_DEG,
            map: MapConfig::default(),
        }
    }
}

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl AppConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Loads from `SHELTER_CONFIG` when set and non-blank, else defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_file(raw.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Resolved avatar directory.
    pub fn avatar_root(&self) -> &Path {
        self.avatar_dir.as_deref().unwrap_or(&self.data_dir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.proximity_threshold_deg.is_finite() && self.proximity_threshold_deg > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "proximity_threshold_deg must be a positive number, got {}",
                self.proximity_threshold_deg
            )));
        }
        if self.datasets.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one shelter dataset is required".to_string(),
            ));
        }
        if let Some(dataset) = self
            .datasets
            .iter()
            .find(|dataset| dataset.location.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "dataset `{}` has an empty location",
                dataset.name
            )));
        }
        if !self.map.center.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "map center {:?} is outside WGS84 bounds",
                self.map.center
            )));
        }
        if !(0.0..=24.0).contains(&self.map.zoom) || !(0.0..=24.0).contains(&self.map.selection_zoom)
        {
            return Err(ConfigError::Invalid(
                "map zoom levels must be within 0..=24".to_string(),
            ));
        }
        Ok(())
    }
}
