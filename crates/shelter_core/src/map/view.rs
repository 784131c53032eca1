//! Shelter map view reconciler.
//!
//! # Responsibility
//! - Keep the map widget's sources in step with catalog and household state.
//! - Translate widget events into camera moves and detail popups.
//!
//! # Invariants
//! - Sources and layers are added once per mount.
//! - Each pass issues only the source calls its input changes require:
//!   a new catalog generation resets shelter sources, a selection change
//!   patches them, and member changes are sent as feature diffs.
//! - Clustered plus highlighted shelter features always cover the catalog
//!   exactly once.
//! - Camera transitions fire on selection changes after the first pass,
//!   never on mount.

use super::avatar::{AvatarLoader, AvatarRegistry};
use super::event::MapEvent;
use super::geojson::{Feature, FeatureCollection};
use super::popup::{member_popup, shelter_popup};
use super::style::{
    base_layers, base_sources, COMMON_SHELTER_SOURCE, MEMBERS_SOURCE, SHELTERS_SOURCE,
};
use super::widget::{CameraTarget, MapWidget, SourceDiff};
use crate::catalog::loader::CatalogState;
use crate::catalog::ShelterCatalog;
use crate::config::MapConfig;
use crate::model::member::{Member, MemberId};
use crate::model::shelter::{CommonShelter, Shelter};
use crate::proximity::{ProximityMatcher, ProximityStatus};
use log::{debug, info};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Observable inputs of one reconcile pass.
#[derive(Debug, Clone, Copy)]
pub struct MapInputs<'a> {
    pub catalog: &'a CatalogState,
    pub members: &'a [Member],
    pub common_shelter: Option<&'a CommonShelter>,
}

/// What one reconcile pass sent to the widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub mounted: bool,
    pub shelters_reset: bool,
    pub shelters_patched: bool,
    pub common_shelter_updated: bool,
    pub members_added: usize,
    pub members_updated: usize,
    pub members_removed: usize,
    pub images_added: usize,
    pub camera_moved: bool,
}

impl ReconcileReport {
    /// Returns whether the pass issued no widget calls at all.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Map-side loading indicator derived from the catalog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingIndicator {
    Loading,
    Failed,
    Hidden,
}

impl LoadingIndicator {
    pub fn from_catalog(state: &CatalogState) -> Self {
        match state {
            CatalogState::NotLoaded => Self::Loading,
            CatalogState::Failed(_) => Self::Failed,
            CatalogState::Ready(_) => Self::Hidden,
        }
    }
}

/// Reconciler between application state and the map widget.
#[derive(Debug)]
pub struct ShelterMapView {
    map: MapConfig,
    matcher: ProximityMatcher,
    avatars: AvatarRegistry,
    mounted: bool,
    synced_once: bool,
    rendered_generation: Option<u64>,
    rendered_highlight: Option<usize>,
    rendered_selection: Option<String>,
    rendered_members: BTreeMap<MemberId, Feature>,
}

impl ShelterMapView {
    pub fn new(map: MapConfig, matcher: ProximityMatcher) -> Self {
        Self {
            map,
            matcher,
            avatars: AvatarRegistry::new(),
            mounted: false,
            synced_once: false,
            rendered_generation: None,
            rendered_highlight: None,
            rendered_selection: None,
            rendered_members: BTreeMap::new(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn matcher(&self) -> &ProximityMatcher {
        &self.matcher
    }

    pub fn avatars(&self) -> &AvatarRegistry {
        &self.avatars
    }

    /// Returns whether the loading indicator should be shown.
    pub fn is_loading(catalog: &CatalogState) -> bool {
        LoadingIndicator::from_catalog(catalog) == LoadingIndicator::Loading
    }

    /// Camera the host should create the map with.
    pub fn initial_camera(&self) -> CameraTarget {
        CameraTarget {
            center: self.map.center,
            zoom: self.map.zoom,
        }
    }

    /// Declares sources and layers. Returns `false` when already mounted.
    pub fn mount<W: MapWidget>(&mut self, widget: &mut W) -> bool {
        if self.mounted {
            return false;
        }
        for source in base_sources(&self.map) {
            widget.add_source(source);
        }
        for layer in base_layers() {
            widget.add_layer(layer);
        }
        self.mounted = true;
        info!("event=map_mount module=map status=ok");
        true
    }

    /// Forgets everything rendered; the next pass mounts from scratch.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.synced_once = false;
        self.rendered_generation = None;
        self.rendered_highlight = None;
        self.rendered_selection = None;
        self.rendered_members.clear();
        self.avatars = AvatarRegistry::new();
    }

    /// Records `address` as the rendered selection without a camera move.
    ///
    /// Used for selections restored from storage, which never fly the map
    /// even when they arrive after the first pass.
    pub fn adopt_selection(&mut self, address: Option<&str>) {
        self.rendered_selection = address.map(str::to_string);
    }

    /// Proximity status of one member against the current catalog.
    pub fn member_status(&self, member: &Member, catalog: &CatalogState) -> ProximityStatus {
        self.matcher.status(member.coordinates, catalog.catalog())
    }

    /// Brings the widget in line with `inputs`.
    pub fn reconcile<W: MapWidget>(
        &mut self,
        inputs: &MapInputs<'_>,
        widget: &mut W,
        avatar_loader: &dyn AvatarLoader,
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            mounted: self.mount(widget),
            ..ReconcileReport::default()
        };

        self.reconcile_shelters(inputs, widget, &mut report);
        self.reconcile_camera(inputs, widget, &mut report);
        self.reconcile_members(inputs, widget, avatar_loader, &mut report);
        self.synced_once = true;

        if !report.is_noop() {
            debug!(
                "event=map_reconcile module=map status=ok shelters_reset={} shelters_patched={} members_added={} members_updated={} members_removed={} images_added={} camera_moved={}",
                report.shelters_reset,
                report.shelters_patched,
                report.members_added,
                report.members_updated,
                report.members_removed,
                report.images_added,
                report.camera_moved
            );
        }
        report
    }

    /// Handles a widget interaction. Returns `false` for events the view
    /// does not own (popup actions) or that reference unknown features.
    pub fn handle_event<W: MapWidget>(
        &self,
        event: &MapEvent,
        inputs: &MapInputs<'_>,
        widget: &mut W,
    ) -> bool {
        match event {
            MapEvent::ClusterClicked {
                center,
                expansion_zoom,
                ..
            } => {
                widget.ease_to(CameraTarget {
                    center: *center,
                    zoom: *expansion_zoom,
                });
                true
            }
            MapEvent::ShelterClicked { feature_id } => {
                let Some(catalog) = inputs.catalog.catalog() else {
                    return false;
                };
                let Some(index) = usize::try_from(*feature_id).ok() else {
                    return false;
                };
                let Some(shelter) = catalog.get(index) else {
                    debug!("event=map_click module=map status=ignored feature_id={feature_id}");
                    return false;
                };
                let is_common = highlighted_index(catalog, inputs.common_shelter) == Some(index);
                widget.show_popup(shelter_popup(shelter, index, is_common));
                true
            }
            MapEvent::CommonShelterClicked => {
                let Some(catalog) = inputs.catalog.catalog() else {
                    return false;
                };
                let Some(index) = highlighted_index(catalog, inputs.common_shelter) else {
                    return false;
                };
                let Some(shelter) = catalog.get(index) else {
                    return false;
                };
                widget.show_popup(shelter_popup(shelter, index, true));
                true
            }
            MapEvent::MemberClicked { member_id } => {
                let Some(member) = inputs.members.iter().find(|member| member.id == *member_id)
                else {
                    return false;
                };
                let status = self.member_status(member, inputs.catalog);
                widget.show_popup(member_popup(member, &status));
                true
            }
            MapEvent::PopupAction(_) => false,
        }
    }

    fn reconcile_shelters<W: MapWidget>(
        &mut self,
        inputs: &MapInputs<'_>,
        widget: &mut W,
        report: &mut ReconcileReport,
    ) {
        let catalog = inputs.catalog.catalog();
        let generation = catalog.map(ShelterCatalog::generation);
        let selected = inputs.common_shelter.map(|shelter| shelter.address.as_str());
        let partition = catalog.map(|catalog| catalog.partition(selected));
        let highlight = partition.as_ref().and_then(|partition| partition.highlighted);

        if generation != self.rendered_generation {
            let clustered = match (catalog, &partition) {
                (Some(catalog), Some(partition)) => partition
                    .clustered
                    .iter()
                    .filter_map(|&index| catalog.get(index).map(|shelter| shelter_feature(index, shelter)))
                    .collect(),
                _ => Vec::new(),
            };
            widget.set_source_data(SHELTERS_SOURCE, FeatureCollection::new(clustered));
            widget.set_source_data(COMMON_SHELTER_SOURCE, highlight_collection(catalog, highlight));
            report.shelters_reset = true;
            report.common_shelter_updated = true;
        } else if highlight != self.rendered_highlight {
            if let Some(catalog) = catalog {
                let mut diff = SourceDiff::default();
                if let Some(index) = highlight {
                    diff.remove.push(index as u64);
                }
                if let Some(shelter) = self
                    .rendered_highlight
                    .and_then(|index| catalog.get(index).map(|shelter| (index, shelter)))
                {
                    diff.add.push(shelter_feature(shelter.0, shelter.1));
                }
                widget.update_source(SHELTERS_SOURCE, diff);
                widget.set_source_data(
                    COMMON_SHELTER_SOURCE,
                    highlight_collection(Some(catalog), highlight),
                );
                report.shelters_patched = true;
                report.common_shelter_updated = true;
            }
        }

        self.rendered_generation = generation;
        self.rendered_highlight = highlight;
    }

    fn reconcile_camera<W: MapWidget>(
        &mut self,
        inputs: &MapInputs<'_>,
        widget: &mut W,
        report: &mut ReconcileReport,
    ) {
        let selection = inputs.common_shelter.map(|shelter| shelter.address.clone());
        if selection == self.rendered_selection {
            return;
        }
        if let (true, Some(shelter)) = (self.synced_once, inputs.common_shelter) {
            widget.fly_to(CameraTarget {
                center: shelter.coordinates,
                zoom: self.map.selection_zoom,
            });
            report.camera_moved = true;
        }
        self.rendered_selection = selection;
    }

    fn reconcile_members<W: MapWidget>(
        &mut self,
        inputs: &MapInputs<'_>,
        widget: &mut W,
        avatar_loader: &dyn AvatarLoader,
        report: &mut ReconcileReport,
    ) {
        let catalog = inputs.catalog.catalog();
        let mut next = BTreeMap::new();

        for member in inputs.members {
            let avatar_ref = member.avatar_ref.trim();
            if !avatar_ref.is_empty() {
                if let Some(image) = self.avatars.ensure(avatar_ref, avatar_loader) {
                    widget.add_image(&AvatarRegistry::image_name(avatar_ref), &image);
                    report.images_added += 1;
                }
            }
            let status = self.matcher.status(member.coordinates, catalog);
            let icon = self.avatars.icon(avatar_ref);
            next.insert(member.id, member_feature(member, &status, icon));
        }

        let mut diff = SourceDiff::default();
        for (id, feature) in &next {
            match self.rendered_members.get(id) {
                None => diff.add.push(feature.clone()),
                Some(previous) if previous != feature => diff.update.push(feature.clone()),
                Some(_) => {}
            }
        }
        diff.remove = self
            .rendered_members
            .keys()
            .filter(|id| !next.contains_key(id))
            .map(|id| u64::from(*id))
            .collect();

        if !diff.is_empty() {
            report.members_added = diff.add.len();
            report.members_updated = diff.update.len();
            report.members_removed = diff.remove.len();
            widget.update_source(MEMBERS_SOURCE, diff);
        }
        self.rendered_members = next;
    }
}

fn highlighted_index(catalog: &ShelterCatalog, common: Option<&CommonShelter>) -> Option<usize> {
    common.and_then(|shelter| catalog.position_by_address(&shelter.address))
}

fn highlight_collection(catalog: Option<&ShelterCatalog>, highlight: Option<usize>) -> FeatureCollection {
    let feature = catalog
        .zip(highlight)
        .and_then(|(catalog, index)| catalog.get(index).map(|shelter| shelter_feature(index, shelter)));
    FeatureCollection::new(feature.into_iter().collect())
}

/// GeoJSON feature for one catalog shelter; the id is its catalog index.
pub fn shelter_feature(index: usize, shelter: &Shelter) -> Feature {
    let mut properties = Map::new();
    properties.insert("category".to_string(), json!(shelter.category));
    properties.insert("address".to_string(), json!(shelter.address));
    properties.insert("village".to_string(), json!(shelter.village));
    properties.insert("capacity".to_string(), json!(shelter.capacity));
    Feature::point(index as u64, shelter.coordinates, properties)
}

/// GeoJSON feature for one member marker.
///
/// `icon` is omitted when the avatar is missing or failed, which selects
/// the fallback ring-only marker.
pub fn member_feature(member: &Member, status: &ProximityStatus, icon: Option<&str>) -> Feature {
    let mut properties = Map::new();
    properties.insert("id".to_string(), json!(member.id));
    properties.insert("name".to_string(), json!(member.name));
    properties.insert("phone".to_string(), json!(member.phone));
    properties.insert("relation".to_string(), json!(member.relation));
    properties.insert("status".to_string(), json!(status.as_str()));
    let (shelter_name, shelter_address) = match status {
        ProximityStatus::AtShelter { name, address, .. } => (json!(name), json!(address)),
        ProximityStatus::Outside => (Value::Null, Value::Null),
    };
    properties.insert("shelter_name".to_string(), shelter_name);
    properties.insert("shelter_address".to_string(), shelter_address);
    if let Some(icon) = icon {
        properties.insert("icon".to_string(), json!(icon));
    }
    Feature::point(u64::from(member.id), member.coordinates, properties)
}
