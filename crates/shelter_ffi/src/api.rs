//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hand map widget commands to the host as JSON for replay.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - At most one session is active per process; starting again replaces it.
//! - Every session call leaves its map commands queued until drained.

use log::{error, info};
use shelter_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, CatalogState, LngLat, MapCommandBuffer, MapEvent, MemberDraft, MemberPatch,
    PreferenceStore, ProximityStatus, ShelterSession,
};
use std::sync::{Mutex, PoisonError};

type FfiSession = ShelterSession<Box<dyn PreferenceStore + Send>, MapCommandBuffer>;

static SESSION: Mutex<Option<FfiSession>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation took effect.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Session startup envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStartResponse {
    pub ok: bool,
    pub message: String,
    /// `loading|ready|failed`.
    pub catalog_state: String,
    pub member_count: u32,
    /// Restored common-shelter address, if any.
    pub common_shelter_address: Option<String>,
    /// Initial camera for map creation.
    pub center_lng: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl SessionStartResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            catalog_state: "loading".to_string(),
            member_count: 0,
            common_shelter_address: None,
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 0.0,
        }
    }
}

/// Member add envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAddResponse {
    pub ok: bool,
    /// Assigned member id on success.
    pub member_id: Option<u32>,
    pub message: String,
}

/// One member's proximity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStatusItem {
    pub member_id: u32,
    pub name: String,
    /// `at_shelter|outside`.
    pub status: String,
    pub shelter_address: Option<String>,
}

/// One shelter picker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterSearchItem {
    /// Catalog index; pass back through `common_shelter_select_index`.
    pub shelter_index: u32,
    pub category: String,
    pub address: String,
    pub village: Option<String>,
    pub capacity: Option<u32>,
}

/// Shelter picker envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelterSearchResponse {
    pub items: Vec<ShelterSearchItem>,
    pub message: String,
}

/// Starts (or restarts) the process session.
///
/// Input semantics:
/// - `config_path`: JSON config file; `None` falls back to `SHELTER_CONFIG`
///   and then to built-in defaults.
///
/// # FFI contract
/// - Sync call; reads datasets, contacts and preferences from disk.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn session_start(config_path: Option<String>) -> SessionStartResponse {
    let config = match config_path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => AppConfig::from_file(path),
        _ => AppConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            error!("event=session_start module=ffi status=error error={err}");
            return SessionStartResponse::failure(format!("session_start failed: {err}"));
        }
    };

    let mut session = match ShelterSession::from_config(&config, MapCommandBuffer::new()) {
        Ok(session) => session,
        Err(err) => {
            error!("event=session_start module=ffi status=error error={err}");
            return SessionStartResponse::failure(format!("session_start failed: {err}"));
        }
    };
    session.start();

    let camera = session.view().initial_camera();
    let response = SessionStartResponse {
        ok: true,
        message: "Session started.".to_string(),
        catalog_state: catalog_state_label(session.catalog_state()).to_string(),
        member_count: u32::try_from(session.store().members().len()).unwrap_or(u32::MAX),
        common_shelter_address: session
            .store()
            .common_shelter()
            .map(|shelter| shelter.address.clone()),
        center_lng: camera.center.lng,
        center_lat: camera.center.lat,
        zoom: camera.zoom,
    };

    *lock_session() = Some(session);
    info!("event=session_start module=ffi status=ok");
    response
}

/// Drops the active session and any undrained map commands.
#[flutter_rust_bridge::frb(sync)]
pub fn session_stop() -> ActionResponse {
    match lock_session().take() {
        Some(_) => ActionResponse::success("Session stopped."),
        None => ActionResponse::failure("session_stop failed: session not started"),
    }
}

/// Adds a household member.
#[flutter_rust_bridge::frb(sync)]
pub fn member_add(
    name: String,
    lng: f64,
    lat: f64,
    avatar: Option<String>,
    phone: Option<String>,
    relation: Option<String>,
) -> MemberAddResponse {
    let coordinates = LngLat::new(lng, lat);
    if !coordinates.is_valid() {
        return MemberAddResponse {
            ok: false,
            member_id: None,
            message: format!("member_add failed: invalid coordinates [{lng}, {lat}]"),
        };
    }
    let mut draft = MemberDraft::new(name.trim(), coordinates);
    draft.avatar_ref = avatar.unwrap_or_default();
    draft.phone = phone.unwrap_or_default();
    draft.relation = relation.unwrap_or_default();

    match with_session(|session| session.add_member(draft)) {
        Ok(Some(member_id)) => MemberAddResponse {
            ok: true,
            member_id: Some(member_id),
            message: "Member added.".to_string(),
        },
        Ok(None) => MemberAddResponse {
            ok: false,
            member_id: None,
            message: "member_add failed: no member id left to assign".to_string(),
        },
        Err(err) => MemberAddResponse {
            ok: false,
            member_id: None,
            message: format!("member_add failed: {err}"),
        },
    }
}

/// Removes a member; unknown ids are a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn member_remove(member_id: u32) -> ActionResponse {
    match with_session(|session| session.remove_member(member_id)) {
        Ok(()) => ActionResponse::success("Member removed."),
        Err(err) => ActionResponse::failure(format!("member_remove failed: {err}")),
    }
}

/// Partially updates a member. Coordinates apply only when both are given.
#[flutter_rust_bridge::frb(sync)]
pub fn member_update(
    member_id: u32,
    name: Option<String>,
    avatar: Option<String>,
    phone: Option<String>,
    relation: Option<String>,
    lng: Option<f64>,
    lat: Option<f64>,
) -> ActionResponse {
    let coordinates = match (lng, lat) {
        (Some(lng), Some(lat)) => {
            let coordinates = LngLat::new(lng, lat);
            if !coordinates.is_valid() {
                return ActionResponse::failure(format!(
                    "member_update failed: invalid coordinates [{lng}, {lat}]"
                ));
            }
            Some(coordinates)
        }
        (None, None) => None,
        _ => {
            return ActionResponse::failure(
                "member_update failed: lng and lat must be given together",
            )
        }
    };
    let patch = MemberPatch {
        name,
        avatar_ref: avatar,
        phone,
        relation,
        coordinates,
    };
    match with_session(|session| session.update_member(member_id, &patch)) {
        Ok(()) => ActionResponse::success("Member updated."),
        Err(err) => ActionResponse::failure(format!("member_update failed: {err}")),
    }
}

/// Lists members with their current proximity status.
#[flutter_rust_bridge::frb(sync)]
pub fn member_statuses() -> Vec<MemberStatusItem> {
    with_session(|session| {
        session
            .member_statuses()
            .into_iter()
            .filter_map(|(member_id, status)| {
                let member = session.store().member(member_id)?;
                let shelter_address = match &status {
                    ProximityStatus::AtShelter { address, .. } => Some(address.clone()),
                    ProximityStatus::Outside => None,
                };
                Some(MemberStatusItem {
                    member_id,
                    name: member.name.clone(),
                    status: status.as_str().to_string(),
                    shelter_address,
                })
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Filters shelters for the picker dialog.
///
/// # FFI contract
/// - Blank query browses the first 100 shelters; otherwise at most 50 hits.
/// - Loads the catalog on first use.
#[flutter_rust_bridge::frb(sync)]
pub fn shelter_search(query: String) -> ShelterSearchResponse {
    let result = with_session(|session| {
        let items = session
            .search_shelters(&query)
            .into_iter()
            .map(|hit| ShelterSearchItem {
                shelter_index: u32::try_from(hit.index).unwrap_or(u32::MAX),
                category: hit.shelter.category.clone(),
                address: hit.shelter.address.clone(),
                village: hit.shelter.village.clone(),
                capacity: hit.shelter.capacity,
            })
            .collect::<Vec<_>>();
        (items, session.catalog_failed())
    });

    match result {
        Ok((_, true)) => ShelterSearchResponse {
            items: Vec::new(),
            message: "Shelter data is unavailable.".to_string(),
        },
        Ok((items, false)) => {
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} result(s).", items.len())
            };
            ShelterSearchResponse { items, message }
        }
        Err(err) => ShelterSearchResponse {
            items: Vec::new(),
            message: format!("shelter_search failed: {err}"),
        },
    }
}

/// Selects the common shelter by address and persists it.
#[flutter_rust_bridge::frb(sync)]
pub fn common_shelter_select(address: String) -> ActionResponse {
    match with_session(|session| session.select_common_shelter(address.trim())) {
        Ok(true) => ActionResponse::success("Common shelter set."),
        Ok(false) => ActionResponse::failure("common_shelter_select failed: unknown address"),
        Err(err) => ActionResponse::failure(format!("common_shelter_select failed: {err}")),
    }
}

/// Selects the common shelter by picker index and persists it.
#[flutter_rust_bridge::frb(sync)]
pub fn common_shelter_select_index(shelter_index: u32) -> ActionResponse {
    let Ok(index) = usize::try_from(shelter_index) else {
        return ActionResponse::failure("common_shelter_select_index failed: index out of range");
    };
    match with_session(|session| session.select_shelter_index(index)) {
        Ok(true) => ActionResponse::success("Common shelter set."),
        Ok(false) => {
            ActionResponse::failure("common_shelter_select_index failed: unknown shelter")
        }
        Err(err) => ActionResponse::failure(format!("common_shelter_select_index failed: {err}")),
    }
}

/// Clears the common shelter and its persisted key.
#[flutter_rust_bridge::frb(sync)]
pub fn common_shelter_clear() -> ActionResponse {
    match with_session(|session| session.clear_common_shelter()) {
        Ok(()) => ActionResponse::success("Common shelter cleared."),
        Err(err) => ActionResponse::failure(format!("common_shelter_clear failed: {err}")),
    }
}

/// Feeds one host map event (JSON, tagged by `kind`) into the session.
///
/// # FFI contract
/// - `ok=false` for malformed JSON or events nothing reacted to.
#[flutter_rust_bridge::frb(sync)]
pub fn map_handle_event(event_json: String) -> ActionResponse {
    let event: MapEvent = match serde_json::from_str(&event_json) {
        Ok(event) => event,
        Err(err) => return ActionResponse::failure(format!("map_handle_event failed: {err}")),
    };
    match with_session(|session| session.handle_event(&event)) {
        Ok(true) => ActionResponse::success("Event handled."),
        Ok(false) => ActionResponse::failure("map_handle_event ignored: no matching target"),
        Err(err) => ActionResponse::failure(format!("map_handle_event failed: {err}")),
    }
}

/// Takes queued map commands as a JSON array (`[]` when none or no session).
#[flutter_rust_bridge::frb(sync)]
pub fn map_drain_commands() -> String {
    let drained = with_session(|session| session.widget_mut().drain_json());
    match drained {
        Ok(Ok(json)) => json,
        Ok(Err(err)) => {
            error!("event=map_drain module=ffi status=error error={err}");
            "[]".to_string()
        }
        Err(_) => "[]".to_string(),
    }
}

fn lock_session() -> std::sync::MutexGuard<'static, Option<FfiSession>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(f: impl FnOnce(&mut FfiSession) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    let session = guard
        .as_mut()
        .ok_or_else(|| "session not started".to_string())?;
    Ok(f(session))
}

fn catalog_state_label(state: &CatalogState) -> &'static str {
    match state {
        CatalogState::NotLoaded => "loading",
        CatalogState::Ready(_) => "ready",
        CatalogState::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        common_shelter_clear, common_shelter_select, core_version, init_logging,
        map_drain_commands, map_handle_event, member_add, member_remove, member_statuses,
        member_update, ping, session_start, session_stop, shelter_search,
    };
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    static SESSION_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    fn write_fixture(root: &Path) -> String {
        let dataset = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "類別": "MRT", "地址": "Xinyi Rd 1", "可容納人數": "1,200" },
                    "geometry": { "type": "Point", "coordinates": [121.5, 25.0] }
                },
                {
                    "type": "Feature",
                    "properties": { "類別": "Basement", "地址": "Zhongshan Rd 9" },
                    "geometry": { "type": "Point", "coordinates": [121.52, 25.05] }
                }
            ]
        });
        let contacts = json!({
            "contacts": [
                { "id": 1, "name": "Mom", "avatar": "", "phone": "0912", "relation": "mother", "coordinates": [121.5, 25.0] },
                { "id": 2, "name": "Dad", "avatar": "", "phone": "0913", "relation": "father", "coordinates": [121.6, 25.1] }
            ]
        });
        std::fs::create_dir_all(root.join("public/json")).expect("create dataset dir");
        std::fs::write(root.join("public/json/city.json"), dataset.to_string()).expect("dataset");
        std::fs::write(root.join("public/contacts.json"), contacts.to_string()).expect("contacts");

        let config = json!({
            "data_dir": root.join("public"),
            "datasets": [{ "name": "city", "location": "json/city.json" }],
            "contacts_location": "contacts.json",
            "db_path": root.join("prefs.sqlite3")
        });
        let config_path = root.join("config.json");
        std::fs::write(&config_path, config.to_string()).expect("config");
        config_path.to_string_lossy().into_owned()
    }

    #[test]
    fn calls_without_session_fail_softly() {
        let _guard = SESSION_TEST_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        session_stop();

        assert!(!member_remove(1).ok);
        assert!(member_statuses().is_empty());
        assert_eq!(map_drain_commands(), "[]");
        assert!(shelter_search("x".to_string()).message.contains("not started"));
    }

    #[test]
    fn session_flow_persists_selection_and_queues_commands() {
        let _guard = SESSION_TEST_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = write_fixture(dir.path());

        let started = session_start(Some(config_path.clone()));
        assert!(started.ok, "{}", started.message);
        assert_eq!(started.catalog_state, "ready");
        assert_eq!(started.member_count, 2);
        assert_eq!(started.common_shelter_address, None);

        let statuses = member_statuses();
        assert_eq!(statuses[0].status, "at_shelter");
        assert_eq!(statuses[0].shelter_address.as_deref(), Some("Xinyi Rd 1"));
        assert_eq!(statuses[1].status, "outside");

        let hits = shelter_search("zhongshan".to_string());
        assert_eq!(hits.items.len(), 1);
        assert_eq!(hits.items[0].shelter_index, 1);

        map_drain_commands();
        assert!(common_shelter_select("Zhongshan Rd 9".to_string()).ok);
        assert!(!common_shelter_select("Nowhere".to_string()).ok);
        let commands: serde_json::Value =
            serde_json::from_str(&map_drain_commands()).expect("commands json");
        assert!(commands
            .as_array()
            .expect("array")
            .iter()
            .any(|command| command["op"] == "fly_to"));

        let added = member_add("Kid".to_string(), 121.52, 25.05, None, None, None);
        assert_eq!(added.member_id, Some(3));
        assert!(!member_update(3, None, None, None, None, Some(121.0), None).ok);
        assert!(member_update(3, Some("Kiddo".to_string()), None, None, None, None, None).ok);

        assert!(!map_handle_event("{not json".to_string()).ok);
        assert!(map_handle_event(json!({ "kind": "member_clicked", "member_id": 3 }).to_string()).ok);

        let restarted = session_start(Some(config_path));
        assert_eq!(
            restarted.common_shelter_address.as_deref(),
            Some("Zhongshan Rd 9")
        );
        assert!(common_shelter_clear().ok);
        assert!(session_stop().ok);
    }
}
