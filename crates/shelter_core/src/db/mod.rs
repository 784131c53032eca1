//! SQLite storage bootstrap for client-local preferences.
//!
//! # Responsibility
//! - Open and configure SQLite connections for shelter core.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No preference is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure while bringing up or upgrading the preferences database.
#[derive(Debug)]
pub enum StorageError {
    /// The database could not be opened; `path` is `None` for in-memory.
    Open {
        path: Option<PathBuf>,
        source: rusqlite::Error,
    },
    /// A migration step failed and its transaction was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    NewerSchema { found: u32, supported: u32 },
    Sqlite(rusqlite::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open {
                path: Some(path),
                source,
            } => write!(f, "cannot open preferences at `{}`: {source}", path.display()),
            Self::Open { path: None, source } => {
                write!(f, "cannot open in-memory preferences: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "preferences migration {version} failed: {source}")
            }
            Self::NewerSchema { found, supported } => write!(
                f,
                "preferences schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::NewerSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
