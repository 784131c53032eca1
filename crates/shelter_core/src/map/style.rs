//! Source and layer declarations for the shelter map.

use super::geojson::FeatureCollection;
use super::widget::{ClusterOptions, LayerKind, LayerSpec, SourceSpec};
use crate::config::MapConfig;
use serde_json::{json, Value};

pub const SHELTERS_SOURCE: &str = "shelters";
pub const COMMON_SHELTER_SOURCE: &str = "common-shelter";
pub const MEMBERS_SOURCE: &str = "emergency-contacts";

pub const CLUSTERS_LAYER: &str = "clusters";
pub const CLUSTER_COUNT_LAYER: &str = "cluster-count";
pub const UNCLUSTERED_LAYER: &str = "unclustered-point";
pub const COMMON_SHELTER_GLOW_LAYER: &str = "common-shelter-glow";
pub const COMMON_SHELTER_LAYER: &str = "common-shelter-point";
pub const MEMBER_RING_LAYER: &str = "emergency-contacts-ring";
pub const MEMBER_AVATAR_LAYER: &str = "emergency-contacts";

pub const PRIMARY_COLOR: &str = "#5ab4c5";
pub const SECONDARY_COLOR: &str = "#f5ba4b";
pub const ORANGE_COLOR: &str = "#fd853a";
pub const ALERT_COLOR: &str = "#ef4444";
const WHITE: &str = "#ffffff";

/// Empty sources created once per mount.
pub fn base_sources(map: &MapConfig) -> Vec<SourceSpec> {
    vec![
        SourceSpec {
            id: SHELTERS_SOURCE.to_string(),
            cluster: Some(ClusterOptions {
                max_zoom: map.cluster_max_zoom,
                radius: map.cluster_radius,
            }),
            data: FeatureCollection::default(),
        },
        SourceSpec {
            id: COMMON_SHELTER_SOURCE.to_string(),
            cluster: None,
            data: FeatureCollection::default(),
        },
        SourceSpec {
            id: MEMBERS_SOURCE.to_string(),
            cluster: None,
            data: FeatureCollection::default(),
        },
    ]
}

/// Layers in draw order (bottom first).
pub fn base_layers() -> Vec<LayerSpec> {
    vec![
        layer(
            CLUSTERS_LAYER,
            LayerKind::Circle,
            SHELTERS_SOURCE,
            Some(json!(["has", "point_count"])),
            json!({}),
            json!({
                "circle-color": ["step", ["get", "point_count"], PRIMARY_COLOR, 100, SECONDARY_COLOR, 750, ORANGE_COLOR],
                "circle-radius": ["step", ["get", "point_count"], 20, 100, 30, 750, 40],
                "circle-opacity": 0.9
            }),
        ),
        layer(
            CLUSTER_COUNT_LAYER,
            LayerKind::Symbol,
            SHELTERS_SOURCE,
            Some(json!(["has", "point_count"])),
            json!({
                "text-field": ["get", "point_count_abbreviated"],
                "text-font": ["DIN Offc Pro Medium", "Arial Unicode MS Bold"],
                "text-size": 12
            }),
            json!({ "text-color": WHITE }),
        ),
        layer(
            UNCLUSTERED_LAYER,
            LayerKind::Circle,
            SHELTERS_SOURCE,
            Some(json!(["!", ["has", "point_count"]])),
            json!({}),
            json!({
                "circle-color": PRIMARY_COLOR,
                "circle-radius": 8,
                "circle-stroke-width": 2,
                "circle-stroke-color": WHITE,
                "circle-opacity": 0.9
            }),
        ),
        layer(
            COMMON_SHELTER_GLOW_LAYER,
            LayerKind::Circle,
            COMMON_SHELTER_SOURCE,
            None,
            json!({}),
            json!({
                "circle-radius": 24,
                "circle-color": SECONDARY_COLOR,
                "circle-opacity": 0.4,
                "circle-blur": 1
            }),
        ),
        layer(
            COMMON_SHELTER_LAYER,
            LayerKind::Circle,
            COMMON_SHELTER_SOURCE,
            None,
            json!({}),
            json!({
                "circle-color": SECONDARY_COLOR,
                "circle-radius": 14,
                "circle-stroke-width": 4,
                "circle-stroke-color": WHITE,
                "circle-opacity": 1
            }),
        ),
        // Status ring doubles as the fallback marker when no avatar icon exists.
        layer(
            MEMBER_RING_LAYER,
            LayerKind::Circle,
            MEMBERS_SOURCE,
            None,
            json!({}),
            json!({
                "circle-color": ["match", ["get", "status"], "at_shelter", PRIMARY_COLOR, ALERT_COLOR],
                "circle-radius": ["case", ["has", "icon"], 34, 12],
                "circle-stroke-width": 3,
                "circle-stroke-color": WHITE
            }),
        ),
        layer(
            MEMBER_AVATAR_LAYER,
            LayerKind::Symbol,
            MEMBERS_SOURCE,
            Some(json!(["has", "icon"])),
            json!({
                "icon-image": ["get", "icon"],
                "icon-size": 0.5,
                "icon-allow-overlap": true,
                "icon-anchor": "center"
            }),
            json!({}),
        ),
    ]
}

fn layer(
    id: &str,
    kind: LayerKind,
    source: &str,
    filter: Option<Value>,
    layout: Value,
    paint: Value,
) -> LayerSpec {
    LayerSpec {
        id: id.to_string(),
        kind,
        source: source.to_string(),
        filter,
        layout,
        paint,
    }
}

#[cfg(test)]
mod tests {
    use super::{base_layers, base_sources, SHELTERS_SOURCE};
    use crate::config::MapConfig;
    use std::collections::BTreeSet;

    #[test]
    fn only_shelters_source_clusters() {
        let sources = base_sources(&MapConfig::default());
        let clustered = sources
            .iter()
            .filter(|source| source.cluster.is_some())
            .map(|source| source.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(clustered, vec![SHELTERS_SOURCE]);
    }

    #[test]
    fn layers_reference_declared_sources_and_have_unique_ids() {
        let sources = base_sources(&MapConfig::default())
            .into_iter()
            .map(|source| source.id)
            .collect::<BTreeSet<_>>();
        let layers = base_layers();
        let ids = layers.iter().map(|layer| layer.id.clone()).collect::<BTreeSet<_>>();
        assert_eq!(ids.len(), layers.len());
        assert!(layers.iter().all(|layer| sources.contains(&layer.source)));
    }
}
