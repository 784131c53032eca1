//! Map widget collaborator contract.
//!
//! # Responsibility
//! - Name the subset of the interactive-map API the view drives.
//! - Provide a recording implementation that hosts replay on the real SDK.
//!
//! # Invariants
//! - The view never reads back from the widget; all state flows one way.

use super::avatar::AvatarImage;
use super::geojson::{Feature, FeatureCollection};
use crate::model::location::LngLat;
use serde::Serialize;
use serde_json::Value;

/// Clustering options for a GeoJSON source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterOptions {
    pub max_zoom: u8,
    pub radius: u32,
}

/// GeoJSON source declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSpec {
    pub id: String,
    pub cluster: Option<ClusterOptions>,
    pub data: FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Circle,
    Symbol,
}

/// Style layer declaration; `filter`, `layout` and `paint` use the map
/// SDK's expression JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub filter: Option<Value>,
    pub layout: Value,
    pub paint: Value,
}

/// Feature-level change set for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceDiff {
    pub add: Vec<Feature>,
    pub update: Vec<Feature>,
    pub remove: Vec<u64>,
}

impl SourceDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraTarget {
    pub center: LngLat,
    pub zoom: f64,
}

/// Detail popup anchored at a map point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub coordinates: LngLat,
    pub html: String,
    pub class_name: String,
    pub max_width: String,
}

/// Interactive map operations used by `ShelterMapView`.
pub trait MapWidget {
    fn add_source(&mut self, source: SourceSpec);
    fn add_layer(&mut self, layer: LayerSpec);
    fn set_source_data(&mut self, source_id: &str, data: FeatureCollection);
    fn update_source(&mut self, source_id: &str, diff: SourceDiff);
    /// Registers an icon image; re-adding a name replaces it.
    fn add_image(&mut self, name: &str, image: &AvatarImage);
    /// Short animated pan/zoom.
    fn ease_to(&mut self, camera: CameraTarget);
    /// Long animated flight.
    fn fly_to(&mut self, camera: CameraTarget);
    fn show_popup(&mut self, popup: Popup);
}

/// Serializable record of one widget call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapCommand {
    AddSource(SourceSpec),
    AddLayer(LayerSpec),
    SetSourceData {
        source: String,
        data: FeatureCollection,
    },
    UpdateSource {
        source: String,
        diff: SourceDiff,
    },
    AddImage {
        name: String,
        image: AvatarImage,
    },
    EaseTo(CameraTarget),
    FlyTo(CameraTarget),
    ShowPopup(Popup),
}

/// Widget implementation that records commands for a host to replay.
#[derive(Debug, Clone, Default)]
pub struct MapCommandBuffer {
    commands: Vec<MapCommand>,
}

impl MapCommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[MapCommand] {
        &self.commands
    }

    /// Takes all recorded commands, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<MapCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Takes all recorded commands as a JSON array.
    pub fn drain_json(&mut self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.drain())
    }
}

impl MapWidget for MapCommandBuffer {
    fn add_source(&mut self, source: SourceSpec) {
        self.commands.push(MapCommand::AddSource(source));
    }

    fn add_layer(&mut self, layer: LayerSpec) {
        self.commands.push(MapCommand::AddLayer(layer));
    }

    fn set_source_data(&mut self, source_id: &str, data: FeatureCollection) {
        self.commands.push(MapCommand::SetSourceData {
            source: source_id.to_string(),
            data,
        });
    }

    fn update_source(&mut self, source_id: &str, diff: SourceDiff) {
        self.commands.push(MapCommand::UpdateSource {
            source: source_id.to_string(),
            diff,
        });
    }

    fn add_image(&mut self, name: &str, image: &AvatarImage) {
        self.commands.push(MapCommand::AddImage {
            name: name.to_string(),
            image: image.clone(),
        });
    }

    fn ease_to(&mut self, camera: CameraTarget) {
        self.commands.push(MapCommand::EaseTo(camera));
    }

    fn fly_to(&mut self, camera: CameraTarget) {
        self.commands.push(MapCommand::FlyTo(camera));
    }

    fn show_popup(&mut self, popup: Popup) {
        self.commands.push(MapCommand::ShowPopup(popup));
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraTarget, MapCommandBuffer, MapWidget};
    use crate::model::location::LngLat;
    use serde_json::json;

    #[test]
    fn drain_json_tags_commands_and_empties_buffer() {
        let mut buffer = MapCommandBuffer::new();
        buffer.ease_to(CameraTarget {
            center: LngLat::new(121.5, 25.0),
            zoom: 13.0,
        });

        let raw = buffer.drain_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(
            value,
            json!([{ "op": "ease_to", "center": [121.5, 25.0], "zoom": 13.0 }])
        );
        assert!(buffer.commands().is_empty());
    }
}
