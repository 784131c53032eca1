//! Member avatar loading and the shared image registry.
//!
//! # Responsibility
//! - Load avatar images through a pluggable loader.
//! - Track per-avatar outcomes so each image is registered once.
//!
//! # Invariants
//! - Registry writes are idempotent; recording an outcome twice keeps the
//!   last one.
//! - A failed avatar never blocks other members; it renders the fallback
//!   marker instead.

use crate::catalog::source::DatasetSource;
use log::{debug, error};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const GIF_MAGIC: &[u8] = b"GIF8";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MAGIC: &[u8] = b"WEBP";

/// Loaded avatar image, ready to register with the map widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarImage {
    /// Reference the image was loaded from; hosts may reload from it.
    pub source_ref: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum AvatarError {
    MissingRef,
    Fetch {
        avatar_ref: String,
        source: std::io::Error,
    },
    UnsupportedFormat(String),
}

impl Display for AvatarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRef => write!(f, "member has no avatar reference"),
            Self::Fetch { avatar_ref, source } => {
                write!(f, "failed to load avatar `{avatar_ref}`: {source}")
            }
            Self::UnsupportedFormat(avatar_ref) => {
                write!(f, "avatar `{avatar_ref}` is not a supported image")
            }
        }
    }
}

impl Error for AvatarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            Self::MissingRef | Self::UnsupportedFormat(_) => None,
        }
    }
}

/// Loads avatar images by reference.
pub trait AvatarLoader {
    fn load(&self, avatar_ref: &str) -> Result<AvatarImage, AvatarError>;
}

impl<T: AvatarLoader + ?Sized> AvatarLoader for Box<T> {
    fn load(&self, avatar_ref: &str) -> Result<AvatarImage, AvatarError> {
        (**self).load(avatar_ref)
    }
}

/// Loads avatars from any `DatasetSource` and checks the image signature.
#[derive(Debug, Clone)]
pub struct SourceAvatarLoader<S: DatasetSource> {
    source: S,
}

impl<S: DatasetSource> SourceAvatarLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: DatasetSource> AvatarLoader for SourceAvatarLoader<S> {
    fn load(&self, avatar_ref: &str) -> Result<AvatarImage, AvatarError> {
        let trimmed = avatar_ref.trim();
        if trimmed.is_empty() {
            return Err(AvatarError::MissingRef);
        }
        let bytes = self
            .source
            .fetch(trimmed)
            .map_err(|source| AvatarError::Fetch {
                avatar_ref: trimmed.to_string(),
                source,
            })?;
        if !is_supported_image(&bytes) {
            return Err(AvatarError::UnsupportedFormat(trimmed.to_string()));
        }
        Ok(AvatarImage {
            source_ref: trimmed.to_string(),
            bytes,
        })
    }
}

fn is_supported_image(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_MAGIC)
        || bytes.starts_with(JPEG_MAGIC)
        || bytes.starts_with(GIF_MAGIC)
        || (bytes.starts_with(RIFF_MAGIC) && bytes.get(8..12) == Some(WEBP_MAGIC))
}

/// Outcome of one avatar load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarState {
    Ready { image_name: String },
    Failed,
}

/// Shared registry of avatar outcomes keyed by avatar reference.
#[derive(Debug, Clone, Default)]
pub struct AvatarRegistry {
    entries: BTreeMap<String, AvatarState>,
}

impl AvatarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widget image name for an avatar reference.
    pub fn image_name(avatar_ref: &str) -> String {
        format!("avatar:{}", avatar_ref.trim())
    }

    pub fn state(&self, avatar_ref: &str) -> Option<&AvatarState> {
        self.entries.get(avatar_ref.trim())
    }

    /// Records an outcome; last write wins.
    pub fn record(&mut self, avatar_ref: &str, state: AvatarState) {
        self.entries.insert(avatar_ref.trim().to_string(), state);
    }

    /// Icon name to render, or `None` for the fallback marker.
    pub fn icon(&self, avatar_ref: &str) -> Option<&str> {
        match self.state(avatar_ref)? {
            AvatarState::Ready { image_name } => Some(image_name.as_str()),
            AvatarState::Failed => None,
        }
    }

    /// Loads `avatar_ref` unless an outcome is already recorded.
    ///
    /// Returns the freshly loaded image so the caller can register it.
    pub fn ensure(&mut self, avatar_ref: &str, loader: &dyn AvatarLoader) -> Option<AvatarImage> {
        if self.state(avatar_ref).is_some() {
            return None;
        }
        match loader.load(avatar_ref) {
            Ok(image) => {
                debug!("event=avatar_load module=map status=ok");
                self.record(
                    avatar_ref,
                    AvatarState::Ready {
                        image_name: Self::image_name(avatar_ref),
                    },
                );
                Some(image)
            }
            Err(err) => {
                error!("event=avatar_load module=map status=error error={err}");
                self.record(avatar_ref, AvatarState::Failed);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
