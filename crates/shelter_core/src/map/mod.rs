//! Map projection and reconciliation.
//!
//! # Responsibility
//! - Describe the map widget collaborator as a command-oriented trait.
//! - Project catalog and household state into GeoJSON sources.
//! - Reconcile rendered sources with application state using diffs.
//!
//! # Invariants
//! - Application state is the single source of truth; the widget only
//!   receives commands.
//! - Sources and layers are created at most once per mount.

pub mod avatar;
pub mod event;
pub mod geojson;
pub mod popup;
pub mod style;
pub mod view;
pub mod widget;
