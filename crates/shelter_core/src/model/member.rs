//! Household member domain model.
//!
//! # Responsibility
//! - Define the member record rendered on the map and listed in contacts.
//! - Provide draft/patch shapes for add and partial-update flows.
//!
//! # Invariants
//! - `id` is assigned by `FamilyStore`, never by callers of `add_member`.
//! - A patch only touches fields it carries.

use super::location::LngLat;
use serde::{Deserialize, Serialize};

/// Process-assigned sequential member identifier.
pub type MemberId = u32;

/// One household member with a last known location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Image reference (path or URL) for the map marker.
    ///
    /// Serialized as `avatar` to match the contacts resource.
    #[serde(rename = "avatar", default)]
    pub avatar_ref: String,
    #[serde(default)]
    pub phone: String,
    /// Free-form relation label, e.g. "mother".
    #[serde(default)]
    pub relation: String,
    pub coordinates: LngLat,
}

/// Member fields supplied by the caller of `FamilyStore::add_member`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDraft {
    pub name: String,
    pub avatar_ref: String,
    pub phone: String,
    pub relation: String,
    pub coordinates: LngLat,
}

impl MemberDraft {
    /// Creates a draft with only a name and location.
    pub fn new(name: impl Into<String>, coordinates: LngLat) -> Self {
        Self {
            name: name.into(),
            avatar_ref: String::new(),
            phone: String::new(),
            relation: String::new(),
            coordinates,
        }
    }

    pub(crate) fn into_member(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name,
            avatar_ref: self.avatar_ref,
            phone: self.phone,
            relation: self.relation,
            coordinates: self.coordinates,
        }
    }
}

/// Partial update for an existing member. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub avatar_ref: Option<String>,
    pub phone: Option<String>,
    pub relation: Option<String>,
    pub coordinates: Option<LngLat>,
}

impl MemberPatch {
    /// Patch that only moves the member.
    pub fn location(coordinates: LngLat) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.avatar_ref.is_none()
            && self.phone.is_none()
            && self.relation.is_none()
            && self.coordinates.is_none()
    }

    /// Merges carried fields into `member`.
    ///
    /// Returns `true` when at least one field value actually changed.
    pub fn apply_to(&self, member: &mut Member) -> bool {
        let mut changed = false;
        changed |= merge_field(&mut member.name, &self.name);
        changed |= merge_field(&mut member.avatar_ref, &self.avatar_ref);
        changed |= merge_field(&mut member.phone, &self.phone);
        changed |= merge_field(&mut member.relation, &self.relation);
        changed |= merge_field(&mut member.coordinates, &self.coordinates);
        changed
    }
}

fn merge_field<T: Clone + PartialEq>(target: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(value) if target != value => {
            *target = value.clone();
            true
        }
        _ => false,
    }
}
