//! Flutter bridge for the shelter map core.

pub mod api;
