//! Household member store with subscribe/notify.
//!
//! # Responsibility
//! - Own the member list and the selected common shelter.
//! - Assign member ids and broadcast change events.
//!
//! # Invariants
//! - Member ids are unique and never reused within one store.
//! - Unknown ids on update/remove are silent no-ops.
//! - Subscribers are notified only when state actually changed.

use crate::model::member::{Member, MemberDraft, MemberId, MemberPatch};
use crate::model::shelter::CommonShelter;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Change notification delivered to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyEvent {
    MemberAdded(MemberId),
    MemberRemoved(MemberId),
    MemberUpdated(MemberId),
    /// Whole member list replaced by a seed load.
    MembersReplaced { count: usize },
    CommonShelterChanged,
}

/// Handle returned by `FamilyStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&FamilyEvent) + Send>;

/// Explicitly constructed household state store.
#[derive(Default)]
pub struct FamilyStore {
    members: Vec<Member>,
    common_shelter: Option<CommonShelter>,
    id_high_water: MemberId,
    revision: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl FamilyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn common_shelter(&self) -> Option<&CommonShelter> {
        self.common_shelter.as_ref()
    }

    /// Number of effective mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Appends a member under the next sequential id.
    ///
    /// The id is one above the largest id this store has ever held, which
    /// equals "max existing id + 1" until the current maximum is removed.
    /// Returns `None` once the id space is exhausted.
    pub fn add_member(&mut self, draft: MemberDraft) -> Option<MemberId> {
        let current_max = self.members.iter().map(|member| member.id).max().unwrap_or(0);
        let Some(id) = current_max.max(self.id_high_water).checked_add(1) else {
            warn!("event=member_add module=store status=error reason=id_space_exhausted");
            return None;
        };
        self.id_high_water = id;
        self.members.push(draft.into_member(id));
        debug!("event=member_add module=store status=ok member_id={id}");
        self.commit(FamilyEvent::MemberAdded(id));
        Some(id)
    }

    /// Removes a member if present.
    pub fn remove_member(&mut self, id: MemberId) {
        let before = self.members.len();
        self.members.retain(|member| member.id != id);
        if self.members.len() == before {
            return;
        }
        debug!("event=member_remove module=store status=ok member_id={id}");
        self.commit(FamilyEvent::MemberRemoved(id));
    }

    /// Merges `patch` into the matching member if present.
    pub fn update_member(&mut self, id: MemberId, patch: &MemberPatch) {
        let Some(member) = self.members.iter_mut().find(|member| member.id == id) else {
            return;
        };
        if patch.apply_to(member) {
            debug!("event=member_update module=store status=ok member_id={id}");
            self.commit(FamilyEvent::MemberUpdated(id));
        }
    }

    /// Replaces the rendezvous selection.
    pub fn set_common_shelter(&mut self, shelter: Option<CommonShelter>) {
        if self.common_shelter == shelter {
            return;
        }
        self.common_shelter = shelter;
        debug!(
            "event=common_shelter_set module=store status=ok selected={}",
            self.common_shelter.is_some()
        );
        self.commit(FamilyEvent::CommonShelterChanged);
    }

    /// Replaces the member list with seed data.
    ///
    /// Members carrying an id already seen earlier in `members` are dropped,
    /// as are members carrying `MemberId::MAX`, so a later add always has
    /// an id left.
    pub fn replace_members(&mut self, members: Vec<Member>) {
        let mut seen = BTreeSet::new();
        let mut dropped = 0usize;
        let mut out_of_range = 0usize;
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            if member.id == MemberId::MAX {
                out_of_range += 1;
            } else if seen.insert(member.id) {
                kept.push(member);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("event=members_seed module=store status=warn duplicate_ids_dropped={dropped}");
        }
        if out_of_range > 0 {
            warn!("event=members_seed module=store status=warn max_ids_dropped={out_of_range}");
        }

        let seed_max = kept.iter().map(|member| member.id).max().unwrap_or(0);
        self.id_high_water = self.id_high_water.max(seed_max);
        self.members = kept;
        let count = self.members.len();
        self.commit(FamilyEvent::MembersReplaced { count });
    }

    /// Registers a callback invoked after every effective mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&FamilyEvent) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Drops a subscription. Unknown handles are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(subscription, _)| *subscription != id);
    }

    fn commit(&mut self, event: FamilyEvent) {
        self.revision += 1;
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }
}

impl std::fmt::Debug for FamilyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyStore")
            .field("members", &self.members)
            .field("common_shelter", &self.common_shelter)
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
