//! Static resource access for datasets and contacts.
//!
//! # Responsibility
//! - Abstract "fetch one static file" behind a small trait.
//! - Keep path handling for the filesystem-backed source in one place.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Fetches raw bytes of one static resource by its location string.
pub trait DatasetSource {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>>;
}

/// Reads resources relative to a root directory, like a static web root.
#[derive(Debug, Clone)]
pub struct FsDatasetSource {
    root: PathBuf,
}

impl FsDatasetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &str) -> io::Result<PathBuf> {
        let relative = Path::new(location.trim().trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("resource location `{location}` must be a relative path inside the root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl DatasetSource for FsDatasetSource {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(location)?)
    }
}

/// In-memory resource table, for bundled assets and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatasetSource {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryDatasetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(location, body);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.entries.insert(location.into(), body.into());
    }
}

impl DatasetSource for MemoryDatasetSource {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        self.entries.get(location).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("resource `{location}` not found"),
            )
        })
    }
}

impl<T: DatasetSource + ?Sized> DatasetSource for Box<T> {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        (**self).fetch(location)
    }
}
