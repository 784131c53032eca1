//! Minimal GeoJSON output shapes for map sources.

use crate::model::location::LngLat;
use serde::Serialize;
use serde_json::{Map, Value};

/// Point-only geometry; every rendered feature is a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: LngLat },
}

/// One source feature with a numeric id usable for diff updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub id: u64,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn point(id: u64, coordinates: LngLat, properties: Map<String, Value>) -> Self {
        Self {
            id,
            geometry: Geometry::Point { coordinates },
            properties,
        }
    }

    pub fn coordinates(&self) -> LngLat {
        match &self.geometry {
            Geometry::Point { coordinates } => *coordinates,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }
}
