#![allow(dead_code)]

use serde_json::json;
use shelter_core::{DatasetSource, LngLat, Member, MemoryDatasetSource};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const NEW_TAIPEI: &str = "json/new_taipei.json";
pub const TAIPEI: &str = "json/taipei.json";
pub const CONTACTS: &str = "emergency-contacts.json";
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfixture";

/// Point FeatureCollection from `(category, address, lng, lat)` rows.
pub fn dataset(rows: &[(&str, &str, f64, f64)]) -> Vec<u8> {
    let features = rows
        .iter()
        .map(|(category, address, lng, lat)| {
            json!({
                "type": "Feature",
                "properties": { "類別": category, "地址": address, "可容納人數": "120" },
                "geometry": { "type": "Point", "coordinates": [lng, lat] }
            })
        })
        .collect::<Vec<_>>();
    json!({ "type": "FeatureCollection", "features": features })
        .to_string()
        .into_bytes()
}

pub fn member(id: u32, name: &str, avatar_ref: &str, lng: f64, lat: f64) -> Member {
    Member {
        id,
        name: name.to_string(),
        avatar_ref: avatar_ref.to_string(),
        phone: "0912-345-678".to_string(),
        relation: "family".to_string(),
        coordinates: LngLat::new(lng, lat),
    }
}

pub fn contacts(members: &[Member]) -> Vec<u8> {
    json!({ "contacts": members }).to_string().into_bytes()
}

/// Two municipal datasets: three shelters in dataset order.
pub fn standard_source() -> MemoryDatasetSource {
    MemoryDatasetSource::new()
        .with(
            NEW_TAIPEI,
            dataset(&[
                ("MRT", "Banqiao Station", 121.4627, 25.0143),
                ("Basement", "Zhonghe Rd 1", 121.5, 25.0),
            ]),
        )
        .with(TAIPEI, dataset(&[("Park", "Xinyi Rd 5", 121.5654, 25.0330)]))
}

/// Counts every fetch made through it.
#[derive(Debug, Clone)]
pub struct CountingSource {
    inner: MemoryDatasetSource,
    fetches: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(inner: MemoryDatasetSource) -> Self {
        Self {
            inner,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DatasetSource for CountingSource {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(location)
    }
}

/// Fails every fetch except `CONTACTS` until switched online.
#[derive(Debug, Clone)]
pub struct FlakySource {
    inner: MemoryDatasetSource,
    online: Arc<AtomicBool>,
}

impl FlakySource {
    pub fn offline(inner: MemoryDatasetSource) -> Self {
        Self {
            inner,
            online: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.online)
    }
}

impl DatasetSource for FlakySource {
    fn fetch(&self, location: &str) -> io::Result<Vec<u8>> {
        if location != CONTACTS && !self.online.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "offline"));
        }
        self.inner.fetch(location)
    }
}
