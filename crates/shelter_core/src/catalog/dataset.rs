//! Municipality shelter dataset decoding.
//!
//! # Responsibility
//! - Decode one GeoJSON point FeatureCollection into `Shelter` records.
//! - Normalize loosely typed properties (string or number) into text.
//!
//! # Invariants
//! - Features without a valid point geometry are skipped, never guessed.
//! - Feature order is preserved.

use crate::model::location::LngLat;
use crate::model::shelter::Shelter;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static NON_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9]").expect("valid non-digit regex"));

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: RawProperties,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(rename = "類別")]
    category: Option<Value>,
    #[serde(rename = "地址")]
    address: Option<Value>,
    #[serde(rename = "村里別")]
    village: Option<Value>,
    #[serde(rename = "可容納人數")]
    capacity: Option<Value>,
    #[serde(rename = "電腦編號")]
    serial: Option<Value>,
    #[serde(rename = "地下樓層數")]
    basement_floors: Option<Value>,
    /// Spelling with a stray space, seen in some municipal exports.
    #[serde(rename = "地下樓 層數")]
    basement_floors_spaced: Option<Value>,
    #[serde(rename = "派出所")]
    police_station: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Decodes one dataset body into shelters.
///
/// # Errors
/// - Returns the JSON error when the body is not a FeatureCollection-like
///   object.
pub fn parse_shelter_dataset(body: &[u8]) -> Result<Vec<Shelter>, serde_json::Error> {
    let collection: RawCollection = serde_json::from_slice(body)?;
    let total = collection.features.len();
    let shelters = collection
        .features
        .into_iter()
        .filter_map(feature_to_shelter)
        .collect::<Vec<_>>();

    let skipped = total - shelters.len();
    if skipped > 0 {
        warn!("event=dataset_parse module=catalog status=warn skipped_features={skipped}");
    }
    Ok(shelters)
}

fn feature_to_shelter(feature: RawFeature) -> Option<Shelter> {
    let coordinates = point_coordinates(feature.geometry.as_ref()?)?;
    let properties = feature.properties;
    Some(Shelter {
        category: value_text(properties.category).unwrap_or_default(),
        address: value_text(properties.address).unwrap_or_default(),
        village: value_text(properties.village),
        capacity: value_text(properties.capacity).and_then(|text| parse_capacity(&text)),
        serial: value_text(properties.serial),
        basement_floors: value_text(properties.basement_floors)
            .or_else(|| value_text(properties.basement_floors_spaced)),
        police_station: value_text(properties.police_station),
        coordinates,
    })
}

fn point_coordinates(geometry: &RawGeometry) -> Option<LngLat> {
    if geometry.kind != "Point" {
        return None;
    }
    let pair = geometry.coordinates.as_array()?;
    let lng = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    let point = LngLat::new(lng, lat);
    point.is_valid().then_some(point)
}

fn value_text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Extracts a head count from values such as `"1,200"` or `"350人"`.
pub(crate) fn parse_capacity(text: &str) -> Option<u32> {
    let digits = NON_DIGIT_RE.replace_all(text, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
