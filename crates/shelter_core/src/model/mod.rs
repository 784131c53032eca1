//! Domain model shared by the store, catalog and map projection.
//!
//! # Responsibility
//! - Define the household member and shelter records owned by core.
//! - Keep coordinates in one `[longitude, latitude]` shape end to end.
//!
//! # Invariants
//! - `MemberId` values are unique inside one `FamilyStore`.
//! - `Shelter` values are immutable once a catalog is loaded.

pub mod location;
pub mod member;
pub mod shelter;
