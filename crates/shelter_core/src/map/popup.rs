//! Detail popup markup for shelters and members.
//!
//! # Invariants
//! - Every dataset or user supplied string is HTML-escaped.
//! - Action buttons carry `data-action` values that map 1:1 onto
//!   `PopupAction` variants.

use super::widget::Popup;
use crate::model::member::Member;
use crate::model::shelter::Shelter;
use crate::proximity::ProximityStatus;

const POPUP_MAX_WIDTH: &str = "320px";
const SHELTER_POPUP_CLASS: &str = "shelter-popup-container";
const MEMBER_POPUP_CLASS: &str = "contact-popup-container";
const NOT_AVAILABLE: &str = "N/A";

/// Popup for one catalog shelter.
pub fn shelter_popup(shelter: &Shelter, shelter_index: usize, is_common: bool) -> Popup {
    let mut html = String::from("<div class=\"shelter-popup\">");
    html.push_str(&format!(
        "<h3 class=\"shelter-popup-title\">{}</h3>",
        escape_html(or_na(Some(shelter.category.as_str())))
    ));
    if is_common {
        html.push_str("<div class=\"common-shelter-badge\">&#11088; Family common shelter</div>");
    }
    html.push_str("<div class=\"shelter-popup-content\">");
    push_row(&mut html, "shelter", "Address", Some(shelter.address.as_str()));
    push_row(&mut html, "shelter", "Village", shelter.village.as_deref());
    let capacity = shelter.capacity.map(|value| value.to_string());
    push_row(&mut html, "shelter", "Capacity", capacity.as_deref());
    push_row(
        &mut html,
        "shelter",
        "Basement floors",
        shelter.basement_floors.as_deref(),
    );
    if let Some(station) = shelter.police_station.as_deref() {
        push_row(&mut html, "shelter", "Police station", Some(station));
    }
    html.push_str("</div>");

    if is_common {
        html.push_str(
            "<button class=\"unset-common-shelter-btn\" data-action=\"unset_common_shelter\">Unset common shelter</button>",
        );
    } else {
        html.push_str(&format!(
            "<button class=\"set-common-shelter-btn\" data-action=\"set_common_shelter\" data-shelter-index=\"{shelter_index}\">Set as common shelter</button>"
        ));
    }
    html.push_str("</div>");

    Popup {
        coordinates: shelter.coordinates,
        html,
        class_name: SHELTER_POPUP_CLASS.to_string(),
        max_width: POPUP_MAX_WIDTH.to_string(),
    }
}

/// Popup for one household member with proximity status text.
pub fn member_popup(member: &Member, status: &ProximityStatus) -> Popup {
    let mut html = String::from("<div class=\"contact-popup\"><div class=\"contact-popup-header\">");
    html.push_str(&format!(
        "<h3 class=\"contact-popup-title\">{}</h3>",
        escape_html(or_na(Some(member.name.as_str())))
    ));
    match status {
        ProximityStatus::AtShelter { .. } => html.push_str(
            "<span class=\"contact-status-badge at-shelter\">At shelter</span>",
        ),
        ProximityStatus::Outside => {
            html.push_str("<span class=\"contact-status-badge outside\">Outside</span>")
        }
    }
    html.push_str("</div><div class=\"contact-popup-content\">");
    push_row(&mut html, "contact", "Relation", Some(member.relation.as_str()));
    push_row(&mut html, "contact", "Phone", Some(member.phone.as_str()));
    match status {
        ProximityStatus::AtShelter { address, name, .. } => {
            push_row(&mut html, "contact", "Shelter", Some(name.as_str()));
            push_row(&mut html, "contact", "Address", Some(address.as_str()));
        }
        ProximityStatus::Outside => {
            let location = format!(
                "{:.5}, {:.5}",
                member.coordinates.lng, member.coordinates.lat
            );
            push_row(&mut html, "contact", "Location", Some(location.as_str()));
        }
    }
    html.push_str("</div></div>");

    Popup {
        coordinates: member.coordinates,
        html,
        class_name: MEMBER_POPUP_CLASS.to_string(),
        max_width: POPUP_MAX_WIDTH.to_string(),
    }
}

fn push_row(html: &mut String, prefix: &str, label: &str, value: Option<&str>) {
    html.push_str(&format!(
        "<div class=\"{prefix}-popup-row\"><span class=\"{prefix}-popup-label\">{label}:</span><span class=\"{prefix}-popup-value\">{}</span></div>",
        escape_html(or_na(value))
    ));
}

fn or_na(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => NOT_AVAILABLE,
    }
}

/// Escapes text for safe inclusion in HTML element content and attributes.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
