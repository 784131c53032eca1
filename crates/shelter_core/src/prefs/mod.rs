//! Client-local scalar preferences.
//!
//! # Responsibility
//! - Persist the selected common-shelter key across sessions.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - One key maps to at most one value; writes replace.
//! - Removing an absent key is not an error.

use crate::db::{open_db, open_db_in_memory, StorageError};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Key holding the address of the household's common shelter.
pub const COMMON_SHELTER_KEY: &str = "common_shelter_address";

pub type PrefsResult<T> = Result<T, PrefsError>;

/// Preference storage error.
#[derive(Debug)]
pub enum PrefsError {
    Storage(StorageError),
    InvalidKey(String),
}

impl Display for PrefsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid preference key: `{key}`"),
        }
    }
}

impl Error for PrefsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<StorageError> for PrefsError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for PrefsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Sqlite(value))
    }
}

/// Scalar key/value persistence contract.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> PrefsResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PrefsResult<()>;
    fn remove(&self, key: &str) -> PrefsResult<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> PrefsResult<()> {
        (**self).remove(key)
    }
}

/// SQLite-backed preferences owning its connection.
pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a preferences database file.
    pub fn open(path: impl AsRef<Path>) -> PrefsResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> PrefsResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefsResult<()> {
        let key = normalize_key(key)?;
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Volatile preferences for tests and hosts without storage.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        let key = normalize_key(key)?;
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let key = normalize_key(key)?;
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefsResult<()> {
        let key = normalize_key(key)?;
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Opens the configured store: SQLite when `db_path` is set, memory otherwise.
pub fn open_preference_store(
    db_path: Option<&Path>,
) -> PrefsResult<Box<dyn PreferenceStore + Send>> {
    match db_path {
        Some(path) => Ok(Box::new(SqlitePreferenceStore::open(path)?)),
        None => Ok(Box::new(MemoryPreferenceStore::new())),
    }
}

fn normalize_key(key: &str) -> PrefsResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(PrefsError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
