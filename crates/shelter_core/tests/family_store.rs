use shelter_core::{
    CommonShelter, FamilyEvent, FamilyStore, LngLat, Member, MemberDraft, MemberPatch,
};
use std::sync::{Arc, Mutex};

fn draft(name: &str) -> MemberDraft {
    MemberDraft::new(name, LngLat::new(121.5, 25.0))
}

fn record_events(store: &mut FamilyStore) -> Arc<Mutex<Vec<FamilyEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn ids_are_sequential_and_not_reused_after_removal() {
    let mut store = FamilyStore::new();

    assert_eq!(store.add_member(draft("A")), Some(1));
    assert_eq!(store.add_member(draft("B")), Some(2));
    store.remove_member(1);
    assert_eq!(store.add_member(draft("C")), Some(3));

    let ids = store.members().iter().map(|member| member.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn removing_unknown_or_already_removed_member_is_a_no_op() {
    let mut store = FamilyStore::new();
    let id = store.add_member(draft("A")).unwrap();
    store.remove_member(id);
    let events = record_events(&mut store);
    let revision = store.revision();

    store.remove_member(id);
    store.remove_member(42);

    assert!(store.members().is_empty());
    assert_eq!(store.revision(), revision);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn update_merges_only_carried_fields() {
    let mut store = FamilyStore::new();
    let mut seed = draft("Mei");
    seed.phone = "0912-000-000".to_string();
    let id = store.add_member(seed).unwrap();
    let events = record_events(&mut store);

    store.update_member(id, &MemberPatch::location(LngLat::new(121.6, 25.1)));
    store.update_member(
        id,
        &MemberPatch {
            relation: Some("sister".to_string()),
            ..MemberPatch::default()
        },
    );
    store.update_member(99, &MemberPatch::location(LngLat::new(0.0, 0.0)));

    let member = store.member(id).unwrap();
    assert_eq!(member.name, "Mei");
    assert_eq!(member.phone, "0912-000-000");
    assert_eq!(member.relation, "sister");
    assert_eq!(member.coordinates, LngLat::new(121.6, 25.1));
    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[FamilyEvent::MemberUpdated(id), FamilyEvent::MemberUpdated(id)]
    );
}

#[test]
fn patch_with_identical_values_does_not_notify() {
    let mut store = FamilyStore::new();
    let id = store.add_member(draft("Mei")).unwrap();
    let events = record_events(&mut store);

    store.update_member(
        id,
        &MemberPatch {
            name: Some("Mei".to_string()),
            ..MemberPatch::default()
        },
    );

    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn set_and_clear_common_shelter() {
    let mut store = FamilyStore::new();
    let events = record_events(&mut store);
    let shelter = CommonShelter {
        address: "Xinyi Rd 1".to_string(),
        coordinates: LngLat::new(121.5, 25.0),
        name: Some("MRT".to_string()),
    };

    store.set_common_shelter(Some(shelter.clone()));
    assert_eq!(store.common_shelter(), Some(&shelter));
    store.set_common_shelter(Some(shelter));
    store.set_common_shelter(None);
    assert_eq!(store.common_shelter(), None);

    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[
            FamilyEvent::CommonShelterChanged,
            FamilyEvent::CommonShelterChanged
        ]
    );
}

#[test]
fn seeding_drops_duplicate_ids_and_continues_numbering_after_seed() {
    let mut store = FamilyStore::new();
    let seed = |id, name: &str| Member {
        id,
        name: name.to_string(),
        avatar_ref: String::new(),
        phone: String::new(),
        relation: String::new(),
        coordinates: LngLat::new(121.5, 25.0),
    };
    let events = record_events(&mut store);

    store.replace_members(vec![seed(4, "Mom"), seed(7, "Dad"), seed(4, "Dup")]);

    let names = store
        .members()
        .iter()
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Mom", "Dad"]);
    assert_eq!(store.add_member(draft("Kid")), Some(8));
    assert_eq!(
        events.lock().unwrap().first(),
        Some(&FamilyEvent::MembersReplaced { count: 2 })
    );
}

#[test]
fn seeds_at_the_id_ceiling_never_overflow_assignment() {
    let mut store = FamilyStore::new();
    let seed = |id, name: &str| Member {
        id,
        name: name.to_string(),
        avatar_ref: String::new(),
        phone: String::new(),
        relation: String::new(),
        coordinates: LngLat::new(121.5, 25.0),
    };

    store.replace_members(vec![seed(u32::MAX, "Overflow"), seed(u32::MAX - 1, "Edge")]);
    let names = store
        .members()
        .iter()
        .map(|member| member.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Edge"]);

    assert_eq!(store.add_member(draft("Last")), Some(u32::MAX));
    let revision = store.revision();
    assert_eq!(store.add_member(draft("None left")), None);
    assert_eq!(store.members().len(), 2);
    assert_eq!(store.revision(), revision);
}
