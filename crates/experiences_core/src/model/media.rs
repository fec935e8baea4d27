//! Media record model.
//!
//! # Responsibility
//! - Describe one asset attached to an experience (audio, video, image).
//! - Apply in-place edits with monotonic `updated_at_ms`.
//!
//! # Invariants
//! - `kind` and `created_at_ms` are fixed at construction.
//! - Either `reference`, `payload`, both or neither may be set; a record
//!   with neither is "empty" and carries no retrievable content.

use super::{check_timestamps, ModelValidationError};
use crate::clock::next_update_ms;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static URI_SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]+):").expect("valid uri scheme regex")
});
static FILE_EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([A-Za-z0-9]+)(?:[?#].*)?$").expect("valid file extension regex")
});

/// Stable identifier of one media record.
pub type MediaId = Uuid;

/// Asset category of a media record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
}

impl MediaKind {
    /// All kinds in picker order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Audio, MediaKind::Video, MediaKind::Image];

    /// Human-facing label (`Audio`, `Video`, `Image`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Image => "Image",
        }
    }

    /// Parses a label case-insensitively, ignoring surrounding whitespace.
    pub fn from_label(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value))
    }

    pub(crate) fn as_db_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw field set used by load/import paths.
///
/// Converted through [`MediaRecord::from_parts`], which validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaParts {
    pub id: MediaId,
    pub kind: MediaKind,
    pub reference: Option<String>,
    pub payload: Option<Vec<u8>>,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

/// One attached asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MediaParts")]
pub struct MediaRecord {
    id: MediaId,
    kind: MediaKind,
    reference: Option<String>,
    payload: Option<Vec<u8>>,
    created_at_ms: i64,
    updated_at_ms: Option<i64>,
}

impl TryFrom<MediaParts> for MediaRecord {
    type Error = ModelValidationError;

    fn try_from(value: MediaParts) -> Result<Self, Self::Error> {
        Self::from_parts(value)
    }
}

impl MediaRecord {
    /// Creates a record with a generated id and no `updated_at_ms`.
    pub fn new(
        kind: MediaKind,
        reference: Option<String>,
        payload: Option<Vec<u8>>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            reference,
            payload,
            created_at_ms,
            updated_at_ms: None,
        }
    }

    /// Rebuilds a record from persisted or imported fields.
    pub fn from_parts(parts: MediaParts) -> Result<Self, ModelValidationError> {
        if parts.id.is_nil() {
            return Err(ModelValidationError::NilId);
        }
        check_timestamps(parts.created_at_ms, parts.updated_at_ms)?;
        Ok(Self {
            id: parts.id,
            kind: parts.kind,
            reference: parts.reference,
            payload: parts.payload,
            created_at_ms: parts.created_at_ms,
            updated_at_ms: parts.updated_at_ms,
        })
    }

    /// Overwrites each supplied field and advances `updated_at_ms`.
    ///
    /// `None` leaves the corresponding field untouched. No check is made that
    /// the new content matches `kind`.
    pub fn mutate(&mut self, reference: Option<String>, payload: Option<Vec<u8>>, now_ms: i64) {
        if let Some(reference) = reference {
            self.reference = Some(reference);
        }
        if let Some(payload) = payload {
            self.payload = Some(payload);
        }
        self.updated_at_ms = Some(next_update_ms(
            self.created_at_ms,
            self.updated_at_ms,
            now_ms,
        ));
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn updated_at_ms(&self) -> Option<i64> {
        self.updated_at_ms
    }

    /// Time shown in media lists: last edit, or creation when never edited.
    pub fn last_modified_ms(&self) -> i64 {
        self.updated_at_ms.unwrap_or(self.created_at_ms)
    }

    /// Returns `false` for an "empty" record (no reference and no payload).
    pub fn has_content(&self) -> bool {
        self.reference.is_some() || self.payload.is_some()
    }

    /// Lowercased URI scheme of `reference`, or `None` for plain paths.
    pub fn reference_scheme(&self) -> Option<String> {
        self.reference.as_deref().and_then(uri_scheme)
    }
}

/// Extracts a lowercased URI scheme (`file`, `https`, ...) from a locator.
///
/// Single-letter prefixes are treated as drive letters, not schemes.
fn uri_scheme(reference: &str) -> Option<String> {
    URI_SCHEME_RE
        .captures(reference.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Guesses the media kind from a locator's file extension.
pub fn infer_kind_from_reference(reference: &str) -> Option<MediaKind> {
    let extension = FILE_EXTENSION_RE
        .captures(reference.trim())
        .and_then(|caps| caps.get(1))?
        .as_str()
        .to_ascii_lowercase();

    match extension.as_str() {
        "caf" | "m4a" | "mp3" | "wav" | "aac" => Some(MediaKind::Audio),
        "mov" | "mp4" | "m4v" => Some(MediaKind::Video),
        "jpg" | "jpeg" | "png" | "heic" | "gif" => Some(MediaKind::Image),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{infer_kind_from_reference, uri_scheme, MediaKind, MediaRecord};

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(MediaKind::from_label(" audio "), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_label("VIDEO"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_label("gif"), None);
        assert_eq!(MediaKind::Image.to_string(), "Image");
    }

    #[test]
    fn scheme_detection_skips_plain_paths() {
        assert_eq!(uri_scheme("file:///tmp/a.caf").as_deref(), Some("file"));
        assert_eq!(uri_scheme("HTTPS://cdn/x.png").as_deref(), Some("https"));
        assert_eq!(uri_scheme("/var/mobile/a.caf"), None);
        assert_eq!(uri_scheme("C:\\clips\\a.mov"), None);
    }

    #[test]
    fn kind_inference_ignores_query_and_case() {
        assert_eq!(
            infer_kind_from_reference("file:///docs/2020-07-10T10:00:00Z.caf"),
            Some(MediaKind::Audio)
        );
        assert_eq!(
            infer_kind_from_reference("https://cdn/clip.MOV?token=1"),
            Some(MediaKind::Video)
        );
        assert_eq!(infer_kind_from_reference("photo.heic"), Some(MediaKind::Image));
        assert_eq!(infer_kind_from_reference("notes.txt"), None);
        assert_eq!(infer_kind_from_reference("no_extension"), None);
    }

    #[test]
    fn empty_record_has_no_content() {
        let record = MediaRecord::new(MediaKind::Audio, None, None, 10);
        assert!(!record.has_content());
        assert_eq!(record.reference_scheme(), None);
    }

    #[test]
    fn last_modified_falls_back_to_creation_time() {
        let mut record = MediaRecord::new(MediaKind::Video, None, None, 10);
        assert_eq!(record.last_modified_ms(), 10);

        record.mutate(Some("clip.mov".to_string()), None, 35);
        assert_eq!(record.last_modified_ms(), 35);
    }

    #[test]
    fn mutate_only_touches_supplied_fields() {
        let mut record =
            MediaRecord::new(MediaKind::Image, Some("a.png".to_string()), None, 10);
        record.mutate(None, Some(vec![1, 2, 3]), 20);

        assert_eq!(record.reference(), Some("a.png"));
        assert_eq!(record.payload(), Some(&[1_u8, 2, 3][..]));
        assert_eq!(record.updated_at_ms(), Some(20));
    }
}
