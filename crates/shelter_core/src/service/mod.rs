//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, catalog, preferences and map view into session flows.
//! - Keep FFI and CLI layers decoupled from storage and widget details.

pub mod session;
