mod common;

use common::{member, standard_source, PNG};
use shelter_core::map::avatar::SourceAvatarLoader;
use shelter_core::map::style::{COMMON_SHELTER_SOURCE, MEMBERS_SOURCE, SHELTERS_SOURCE};
use shelter_core::map::widget::{MapCommand, SourceDiff};
use shelter_core::{
    CatalogState, CommonShelter, DatasetSpec, LngLat, MapCommandBuffer, MapConfig, MapEvent,
    MapInputs, Member, MemoryDatasetSource, ProximityMatcher, ShelterCatalogLoader,
    ShelterMapView,
};

fn ready_catalog() -> CatalogState {
    let mut loader = ShelterCatalogLoader::new(
        standard_source(),
        vec![
            DatasetSpec::new("new_taipei", common::NEW_TAIPEI),
            DatasetSpec::new("taipei", common::TAIPEI),
        ],
    );
    loader.ensure_loaded().clone()
}

fn avatars() -> SourceAvatarLoader<MemoryDatasetSource> {
    SourceAvatarLoader::new(MemoryDatasetSource::new().with("avatars/mom.png", PNG))
}

fn view() -> ShelterMapView {
    ShelterMapView::new(MapConfig::default(), ProximityMatcher::default())
}

fn selection(catalog: &CatalogState, index: usize) -> CommonShelter {
    catalog
        .catalog()
        .and_then(|catalog| catalog.get(index))
        .unwrap()
        .to_common_shelter()
}

fn inputs<'a>(
    catalog: &'a CatalogState,
    members: &'a [Member],
    common_shelter: Option<&'a CommonShelter>,
) -> MapInputs<'a> {
    MapInputs {
        catalog,
        members,
        common_shelter,
    }
}

fn source_data(commands: &[MapCommand], source_id: &str) -> Vec<Vec<u64>> {
    commands
        .iter()
        .filter_map(|command| match command {
            MapCommand::SetSourceData { source, data } if source == source_id => {
                Some(data.features.iter().map(|feature| feature.id).collect())
            }
            _ => None,
        })
        .collect()
}

fn diffs(commands: &[MapCommand], source_id: &str) -> Vec<SourceDiff> {
    commands
        .iter()
        .filter_map(|command| match command {
            MapCommand::UpdateSource { source, diff } if source == source_id => Some(diff.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn mounts_sources_and_layers_once() {
    let catalog = ready_catalog();
    let members = vec![member(1, "Mom", "", 121.6, 25.1)];
    let mut view = view();
    let mut widget = MapCommandBuffer::new();

    let first = view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());
    let second = view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());

    assert!(first.mounted);
    assert!(second.is_noop());
    let commands = widget.drain();
    let sources = commands
        .iter()
        .filter(|command| matches!(command, MapCommand::AddSource(_)))
        .count();
    let layers = commands
        .iter()
        .filter(|command| matches!(command, MapCommand::AddLayer(_)))
        .count();
    assert_eq!(sources, 3);
    assert_eq!(layers, 7);
    assert!(!commands
        .iter()
        .any(|command| matches!(command, MapCommand::FlyTo(_))));
}

#[test]
fn highlighted_and_clustered_shelters_cover_catalog_exactly_once() {
    let catalog = ready_catalog();
    let selected = selection(&catalog, 1);
    let mut view = view();
    let mut widget = MapCommandBuffer::new();

    view.reconcile(&inputs(&catalog, &[], Some(&selected)), &mut widget, &avatars());

    let commands = widget.drain();
    assert_eq!(source_data(&commands, SHELTERS_SOURCE), vec![vec![0, 2]]);
    assert_eq!(source_data(&commands, COMMON_SHELTER_SOURCE), vec![vec![1]]);
}

#[test]
fn selection_change_patches_shelters_and_flies_to_target() {
    let catalog = ready_catalog();
    let first = selection(&catalog, 0);
    let second = selection(&catalog, 2);
    let mut view = view();
    let mut widget = MapCommandBuffer::new();
    view.reconcile(&inputs(&catalog, &[], Some(&first)), &mut widget, &avatars());
    widget.drain();

    let report = view.reconcile(&inputs(&catalog, &[], Some(&second)), &mut widget, &avatars());

    assert!(report.shelters_patched);
    assert!(!report.shelters_reset);
    let commands = widget.drain();
    let patches = diffs(&commands, SHELTERS_SOURCE);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].remove, vec![2]);
    assert_eq!(
        patches[0].add.iter().map(|feature| feature.id).collect::<Vec<_>>(),
        vec![0]
    );
    assert_eq!(source_data(&commands, COMMON_SHELTER_SOURCE), vec![vec![2]]);
    assert!(source_data(&commands, SHELTERS_SOURCE).is_empty());
    let fly = commands
        .iter()
        .find_map(|command| match command {
            MapCommand::FlyTo(camera) => Some(*camera),
            _ => None,
        })
        .unwrap();
    assert_eq!(fly.center, second.coordinates);
    assert_eq!(fly.zoom, MapConfig::default().selection_zoom);
}

#[test]
fn member_changes_are_sent_as_minimal_diffs() {
    let catalog = ready_catalog();
    let mut members = vec![
        member(1, "Mom", "", 121.6, 25.1),
        member(2, "Dad", "", 121.7, 25.2),
    ];
    let mut view = view();
    let mut widget = MapCommandBuffer::new();
    view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());
    let initial = diffs(&widget.drain(), MEMBERS_SOURCE);
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].add.len(), 2);

    members[0].coordinates = LngLat::new(121.5, 25.0);
    let report = view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());
    assert_eq!(
        (report.members_added, report.members_updated, report.members_removed),
        (0, 1, 0)
    );
    let moved = diffs(&widget.drain(), MEMBERS_SOURCE);
    assert_eq!(moved[0].update.len(), 1);
    assert_eq!(moved[0].update[0].id, 1);
    assert_eq!(moved[0].update[0].properties["status"], "at_shelter");
    assert_eq!(moved[0].update[0].properties["shelter_address"], "Zhonghe Rd 1");

    members.remove(1);
    members.push(member(3, "Kid", "", 121.8, 25.3));
    view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());
    let changed = diffs(&widget.drain(), MEMBERS_SOURCE);
    assert_eq!(changed[0].remove, vec![2]);
    assert_eq!(changed[0].add.len(), 1);
    assert_eq!(changed[0].add[0].id, 3);
    assert!(changed[0].update.is_empty());
}

#[test]
fn avatar_images_register_once_and_failures_use_fallback_marker() {
    let catalog = ready_catalog();
    let members = vec![
        member(1, "Mom", "avatars/mom.png", 121.6, 25.1),
        member(2, "Twin", "avatars/mom.png", 121.7, 25.2),
        member(3, "Dad", "avatars/missing.png", 121.8, 25.3),
    ];
    let mut view = view();
    let mut widget = MapCommandBuffer::new();

    let report = view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());

    assert_eq!(report.images_added, 1);
    let commands = widget.drain();
    let added = &diffs(&commands, MEMBERS_SOURCE)[0].add;
    assert_eq!(added[0].properties["icon"], "avatar:avatars/mom.png");
    assert_eq!(added[1].properties["icon"], "avatar:avatars/mom.png");
    assert!(!added[2].properties.contains_key("icon"));
    assert!(view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars()).is_noop());
}

#[test]
fn catalog_arrival_resets_shelters_and_refreshes_member_status() {
    let members = vec![member(1, "Mom", "", 121.5, 25.0)];
    let mut view = view();
    let mut widget = MapCommandBuffer::new();

    let loading = CatalogState::NotLoaded;
    assert!(ShelterMapView::is_loading(&loading));
    let report = view.reconcile(&inputs(&loading, &members, None), &mut widget, &avatars());
    assert!(!report.shelters_reset);
    let first = diffs(&widget.drain(), MEMBERS_SOURCE);
    assert_eq!(first[0].add[0].properties["status"], "outside");

    let catalog = ready_catalog();
    let report = view.reconcile(&inputs(&catalog, &members, None), &mut widget, &avatars());
    assert!(report.shelters_reset);
    let commands = widget.drain();
    assert_eq!(source_data(&commands, SHELTERS_SOURCE), vec![vec![0, 1, 2]]);
    assert_eq!(
        diffs(&commands, MEMBERS_SOURCE)[0].update[0].properties["status"],
        "at_shelter"
    );
}

#[test]
fn events_drive_camera_and_popups() {
    let catalog = ready_catalog();
    let selected = selection(&catalog, 1);
    let members = vec![member(1, "Mom", "", 121.5, 25.0)];
    let mut view = view();
    let mut widget = MapCommandBuffer::new();
    let state = inputs(&catalog, &members, Some(&selected));
    view.reconcile(&state, &mut widget, &avatars());
    widget.drain();

    let cluster = MapEvent::ClusterClicked {
        cluster_id: 9,
        center: LngLat::new(121.5, 25.0),
        expansion_zoom: 13.0,
    };
    assert!(view.handle_event(&cluster, &state, &mut widget));
    assert!(view.handle_event(&MapEvent::ShelterClicked { feature_id: 0 }, &state, &mut widget));
    assert!(view.handle_event(&MapEvent::CommonShelterClicked, &state, &mut widget));
    assert!(view.handle_event(&MapEvent::MemberClicked { member_id: 1 }, &state, &mut widget));
    assert!(!view.handle_event(&MapEvent::ShelterClicked { feature_id: 99 }, &state, &mut widget));
    assert!(!view.handle_event(&MapEvent::MemberClicked { member_id: 7 }, &state, &mut widget));

    let commands = widget.drain();
    assert!(matches!(&commands[0], MapCommand::EaseTo(camera) if camera.zoom == 13.0));
    let popups = commands
        .iter()
        .filter_map(|command| match command {
            MapCommand::ShowPopup(popup) => Some(popup.html.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(popups.len(), 3);
    assert!(popups[0].contains("data-action=\"set_common_shelter\""));
    assert!(popups[1].contains("data-action=\"unset_common_shelter\""));
    assert!(popups[2].contains("At shelter"));
}

#[test]
fn remount_redeclares_sources_without_camera_jump() {
    let catalog = ready_catalog();
    let selected = selection(&catalog, 0);
    let mut view = view();
    let mut widget = MapCommandBuffer::new();
    view.reconcile(&inputs(&catalog, &[], Some(&selected)), &mut widget, &avatars());
    widget.drain();

    view.unmount();
    let report = view.reconcile(&inputs(&catalog, &[], Some(&selected)), &mut widget, &avatars());

    assert!(report.mounted);
    assert!(report.shelters_reset);
    assert!(!report.camera_moved);
    assert_eq!(view.initial_camera().center, MapConfig::default().center);
}
