//! Emergency-contacts seed resource.
//!
//! # Responsibility
//! - Decode the static `{ "contacts": [...] }` resource into members.
//!
//! # Invariants
//! - A missing `contacts` key decodes as an empty list, not an error.

use crate::catalog::source::DatasetSource;
use crate::model::member::Member;
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Contacts resource load error.
#[derive(Debug)]
pub enum ContactsError {
    Fetch(io::Error),
    Parse(serde_json::Error),
}

impl Display for ContactsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "failed to fetch emergency contacts: {err}"),
            Self::Parse(err) => write!(f, "failed to parse emergency contacts: {err}"),
        }
    }
}

impl Error for ContactsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContactsDocument {
    #[serde(default)]
    contacts: Vec<Member>,
}

/// Decodes a contacts resource body.
pub fn parse_contacts(body: &[u8]) -> Result<Vec<Member>, ContactsError> {
    let document: ContactsDocument = serde_json::from_slice(body).map_err(ContactsError::Parse)?;
    Ok(document.contacts)
}

/// Fetches and decodes the contacts resource at `location`.
pub fn load_contacts(
    source: &impl DatasetSource,
    location: &str,
) -> Result<Vec<Member>, ContactsError> {
    let result = source
        .fetch(location)
        .map_err(ContactsError::Fetch)
        .and_then(|body| parse_contacts(&body));
    match &result {
        Ok(members) => info!(
            "event=contacts_load module=contacts status=ok members={}",
            members.len()
        ),
        Err(err) => error!("event=contacts_load module=contacts status=error error={err}"),
    }
    result
}
