//! Shelter session use-case service.
//!
//! # Responsibility
//! - Own the family store, catalog loader, preferences and map view.
//! - Run startup: read the persisted selection once, seed contacts, load
//!   the catalog and render.
//! - Route map events and popup actions to store mutations.
//!
//! # Invariants
//! - Every store mutation made through the session is followed by one
//!   reconcile pass.
//! - A selection only ever refers to an address present in a ready catalog;
//!   a dangling persisted address is cleared, not kept.
//! - Preference and contacts failures are logged and never abort a flow.
//!
//! # See also
//! - `crate::map::view` for the reconcile rules.

use crate::catalog::loader::{CatalogState, ShelterCatalogLoader};
use crate::catalog::search::{search_shelters, SearchHit};
use crate::catalog::source::{DatasetSource, FsDatasetSource};
use crate::config::AppConfig;
use crate::contacts::load_contacts;
use crate::map::avatar::{AvatarLoader, SourceAvatarLoader};
use crate::map::event::{MapEvent, PopupAction};
use crate::map::view::{MapInputs, ReconcileReport, ShelterMapView};
use crate::map::widget::MapWidget;
use crate::model::member::{MemberDraft, MemberId, MemberPatch};
use crate::prefs::{open_preference_store, PreferenceStore, PrefsResult, COMMON_SHELTER_KEY};
use crate::proximity::{ProximityMatcher, ProximityStatus};
use crate::store::family_store::FamilyStore;
use log::{error, info, warn};

type BoxedSource = Box<dyn DatasetSource + Send>;

/// One client session: state, persistence and map wiring.
pub struct ShelterSession<P: PreferenceStore, W: MapWidget> {
    store: FamilyStore,
    loader: ShelterCatalogLoader<BoxedSource>,
    avatar_loader: Box<dyn AvatarLoader + Send>,
    prefs: P,
    view: ShelterMapView,
    widget: W,
    contacts_location: String,
    pending_selection: Option<String>,
    started: bool,
}

impl<W: MapWidget> ShelterSession<Box<dyn PreferenceStore + Send>, W> {
    /// Builds a session reading static files under the configured roots.
    pub fn from_config(config: &AppConfig, widget: W) -> PrefsResult<Self> {
        let prefs = open_preference_store(config.db_path.as_deref())?;
        let source: BoxedSource = Box::new(FsDatasetSource::new(config.data_dir.clone()));
        let avatars = Box::new(SourceAvatarLoader::new(FsDatasetSource::new(
            config.avatar_root().to_path_buf(),
        )));
        Ok(Self::new(config, source, avatars, prefs, widget))
    }
}

impl<P: PreferenceStore, W: MapWidget> ShelterSession<P, W> {
    pub fn new(
        config: &AppConfig,
        source: BoxedSource,
        avatar_loader: Box<dyn AvatarLoader + Send>,
        prefs: P,
        widget: W,
    ) -> Self {
        let matcher = ProximityMatcher::new(config.proximity_threshold_deg);
        Self {
            store: FamilyStore::new(),
            loader: ShelterCatalogLoader::new(source, config.datasets.clone()),
            avatar_loader,
            prefs,
            view: ShelterMapView::new(config.map.clone(), matcher),
            widget,
            contacts_location: config.contacts_location.clone(),
            pending_selection: None,
            started: false,
        }
    }

    pub fn store(&self) -> &FamilyStore {
        &self.store
    }

    /// Direct store access for hosts; call `sync()` after mutating.
    pub fn store_mut(&mut self) -> &mut FamilyStore {
        &mut self.store
    }

    pub fn view(&self) -> &ShelterMapView {
        &self.view
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn catalog_state(&self) -> &CatalogState {
        self.loader.state()
    }

    pub fn is_loading(&self) -> bool {
        ShelterMapView::is_loading(self.loader.state())
    }

    pub fn catalog_failed(&self) -> bool {
        self.loader.state().is_failed()
    }

    /// Runs startup once; later calls only reconcile.
    pub fn start(&mut self) -> ReconcileReport {
        if self.started {
            return self.sync();
        }
        self.started = true;

        self.pending_selection = match self.prefs.get(COMMON_SHELTER_KEY) {
            Ok(value) => value.filter(|address| !address.trim().is_empty()),
            Err(err) => {
                error!("event=prefs_read module=session status=error error={err}");
                None
            }
        };

        if let Ok(members) = load_contacts(self.loader.source(), &self.contacts_location) {
            self.store.replace_members(members);
        }

        self.loader.ensure_loaded();
        let report = self.sync();
        info!(
            "event=session_start module=session status=ok members={} catalog_ready={} selected={}",
            self.store.members().len(),
            self.loader.state().is_ready(),
            self.store.common_shelter().is_some()
        );
        report
    }

    /// Resolves the selection against the catalog and reconciles the map.
    pub fn sync(&mut self) -> ReconcileReport {
        self.resolve_selection();
        let inputs = MapInputs {
            catalog: self.loader.state(),
            members: self.store.members(),
            common_shelter: self.store.common_shelter(),
        };
        self.view
            .reconcile(&inputs, &mut self.widget, &*self.avatar_loader)
    }

    /// Adds a member; `None` when the store has no id left to assign.
    pub fn add_member(&mut self, draft: MemberDraft) -> Option<MemberId> {
        let id = self.store.add_member(draft)?;
        self.sync();
        Some(id)
    }

    pub fn remove_member(&mut self, id: MemberId) {
        self.store.remove_member(id);
        self.sync();
    }

    pub fn update_member(&mut self, id: MemberId, patch: &MemberPatch) {
        self.store.update_member(id, patch);
        self.sync();
    }

    /// Selects the first catalog shelter at `address` and persists it.
    ///
    /// Returns `false` when the catalog is unavailable or has no such address.
    pub fn select_common_shelter(&mut self, address: &str) -> bool {
        self.loader.ensure_loaded();
        let Some(index) = self
            .loader
            .catalog()
            .and_then(|catalog| catalog.position_by_address(address))
        else {
            warn!("event=common_shelter_select module=session status=ignored reason=unknown_address");
            return false;
        };
        self.select_shelter_index(index)
    }

    /// Selects the catalog shelter at `index` and persists it.
    pub fn select_shelter_index(&mut self, index: usize) -> bool {
        let Some(shelter) = self.loader.catalog().and_then(|catalog| catalog.get(index)) else {
            return false;
        };
        let selection = shelter.to_common_shelter();
        if let Err(err) = self.prefs.set(COMMON_SHELTER_KEY, &selection.address) {
            error!("event=prefs_write module=session status=error error={err}");
        }
        self.pending_selection = None;
        self.store.set_common_shelter(Some(selection));
        self.sync();
        true
    }

    /// Clears the selection and its persisted key.
    pub fn clear_common_shelter(&mut self) {
        if let Err(err) = self.prefs.remove(COMMON_SHELTER_KEY) {
            error!("event=prefs_write module=session status=error error={err}");
        }
        self.pending_selection = None;
        self.store.set_common_shelter(None);
        self.sync();
    }

    /// Handles one host event. Returns whether anything reacted to it.
    pub fn handle_event(&mut self, event: &MapEvent) -> bool {
        match event {
            MapEvent::PopupAction(PopupAction::SetCommonShelter { shelter_index }) => {
                self.select_shelter_index(*shelter_index)
            }
            MapEvent::PopupAction(PopupAction::UnsetCommonShelter) => {
                let had_selection = self.store.common_shelter().is_some();
                self.clear_common_shelter();
                had_selection
            }
            _ => {
                let inputs = MapInputs {
                    catalog: self.loader.state(),
                    members: self.store.members(),
                    common_shelter: self.store.common_shelter(),
                };
                self.view.handle_event(event, &inputs, &mut self.widget)
            }
        }
    }

    /// Filters the catalog for the shelter picker, loading it on demand.
    pub fn search_shelters(&mut self, query: &str) -> Vec<SearchHit<'_>> {
        if !self.loader.state().is_ready() {
            self.loader.ensure_loaded();
            self.sync();
        }
        self.loader
            .catalog()
            .map(|catalog| search_shelters(catalog, query))
            .unwrap_or_default()
    }

    /// Current proximity status per member, in store order.
    pub fn member_statuses(&self) -> Vec<(MemberId, ProximityStatus)> {
        self.store
            .members()
            .iter()
            .map(|member| (member.id, self.view.member_status(member, self.loader.state())))
            .collect()
    }

    fn resolve_selection(&mut self) {
        let Some(catalog) = self.loader.catalog() else {
            return;
        };

        if let Some(address) = self.pending_selection.take() {
            match catalog.find_by_address(&address) {
                Some(shelter) => {
                    let restored = shelter.to_common_shelter();
                    self.view.adopt_selection(Some(&restored.address));
                    self.store.set_common_shelter(Some(restored));
                    info!("event=common_shelter_restore module=session status=ok");
                }
                None => self.drop_dangling_selection(),
            }
            return;
        }

        let dangling = self
            .store
            .common_shelter()
            .is_some_and(|selected| catalog.position_by_address(&selected.address).is_none());
        if dangling {
            self.drop_dangling_selection();
        }
    }

    fn drop_dangling_selection(&mut self) {
        warn!("event=common_shelter_restore module=session status=warn reason=address_not_in_catalog");
        if let Err(err) = self.prefs.remove(COMMON_SHELTER_KEY) {
            error!("event=prefs_write module=session status=error error={err}");
        }
        self.store.set_common_shelter(None);
    }
}
