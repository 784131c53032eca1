//! Shelter picker filtering.
//!
//! # Invariants
//! - Blank queries browse the first `BROWSE_LIMIT` entries in catalog order.
//! - Non-blank queries return at most `SEARCH_LIMIT` matches.
//! - Matching is case-insensitive substring on category, address and village.

use super::ShelterCatalog;
use crate::model::shelter::Shelter;
use once_cell::sync::Lazy;
use regex::Regex;

/// Entries shown when the picker has no query.
pub const BROWSE_LIMIT: usize = 100;
/// Maximum number of matches returned for a query.
pub const SEARCH_LIMIT: usize = 50;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// One picker row: catalog index plus the shelter it points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub index: usize,
    pub shelter: &'a Shelter,
}

/// Filters `catalog` for the shelter picker.
pub fn search_shelters<'a>(catalog: &'a ShelterCatalog, query: &str) -> Vec<SearchHit<'a>> {
    let needle = normalize_query(query);
    let hits = catalog
        .shelters()
        .iter()
        .enumerate()
        .map(|(index, shelter)| SearchHit { index, shelter });

    if needle.is_empty() {
        return hits.take(BROWSE_LIMIT).collect();
    }
    hits.filter(|hit| matches_query(hit.shelter, &needle))
        .take(SEARCH_LIMIT)
        .collect()
}

fn normalize_query(query: &str) -> String {
    WHITESPACE_RE
        .replace_all(query.trim(), " ")
        .to_lowercase()
}

fn matches_query(shelter: &Shelter, needle: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(needle);
    contains(&shelter.category)
        || contains(&shelter.address)
        || shelter.village.as_deref().is_some_and(contains)
}
