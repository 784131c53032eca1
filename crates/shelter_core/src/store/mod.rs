//! In-memory application state owned by core.
//!
//! # Responsibility
//! - Hold household members and the rendezvous selection.
//! - Notify subscribers about every effective mutation.
//!
//! # See also
//! - `crate::service::session` for persistence and map wiring.

pub mod family_store;
