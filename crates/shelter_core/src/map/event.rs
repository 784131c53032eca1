//! Events raised by the host map widget.

use crate::model::location::LngLat;
use crate::model::member::MemberId;
use serde::Deserialize;

/// User interaction reported by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapEvent {
    /// A cluster bubble was clicked. The host resolves `expansion_zoom`
    /// from its cluster index (the zoom at which the cluster splits).
    ClusterClicked {
        cluster_id: u64,
        center: LngLat,
        expansion_zoom: f64,
    },
    /// An unclustered shelter point was clicked; `feature_id` is the
    /// feature id the view assigned (the catalog index).
    ShelterClicked { feature_id: u64 },
    CommonShelterClicked,
    MemberClicked { member_id: MemberId },
    /// A button inside a popup was pressed.
    PopupAction(PopupAction),
}

/// Popup button actions, keyed by the button's `data-action` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PopupAction {
    SetCommonShelter { shelter_index: usize },
    UnsetCommonShelter,
}
