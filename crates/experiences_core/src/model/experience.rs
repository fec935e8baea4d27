//! Experience aggregate.
//!
//! # Responsibility
//! - Hold one geolocated entry and its ordered media sequence.
//! - Apply metadata, location and media edits with monotonic timestamps.
//!
//! # Invariants
//! - `media` only grows through `append_media`; existing order is never
//!   reshuffled.
//! - `coordinate` changes only through the explicit `relocate` operation.
//! - Every edit advances `updated_at_ms` strictly.

use super::coordinate::Coordinate;
use super::media::{MediaId, MediaRecord};
use super::{check_timestamps, ModelValidationError};
use crate::clock::next_update_ms;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier of one experience.
pub type ExperienceId = Uuid;

/// Raw field set used by load/import paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceParts {
    pub id: ExperienceId,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub coordinate: Coordinate,
    pub media: Vec<MediaRecord>,
    pub created_at_ms: i64,
    pub updated_at_ms: Option<i64>,
}

/// A user-created, geolocated point of interest with attached media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExperienceParts")]
pub struct Experience {
    id: ExperienceId,
    title: Option<String>,
    subtitle: Option<String>,
    coordinate: Coordinate,
    media: Vec<MediaRecord>,
    created_at_ms: i64,
    updated_at_ms: Option<i64>,
}

impl TryFrom<ExperienceParts> for Experience {
    type Error = ModelValidationError;

    fn try_from(value: ExperienceParts) -> Result<Self, Self::Error> {
        Self::from_parts(value)
    }
}

impl Experience {
    /// Creates an experience with a generated id and no media.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: Some(title.into()),
            subtitle: Some(subtitle.into()),
            coordinate,
            media: Vec::new(),
            created_at_ms,
            updated_at_ms: None,
        }
    }

    /// Rebuilds an experience from persisted or imported fields.
    ///
    /// # Errors
    /// - `NilId` when the experience id or any media id is nil.
    /// - `DuplicateMediaId` when two media records share one id.
    /// - `UpdatedBeforeCreated` for inconsistent timestamps.
    pub fn from_parts(parts: ExperienceParts) -> Result<Self, ModelValidationError> {
        let experience = Self {
            id: parts.id,
            title: parts.title,
            subtitle: parts.subtitle,
            coordinate: parts.coordinate,
            media: parts.media,
            created_at_ms: parts.created_at_ms,
            updated_at_ms: parts.updated_at_ms,
        };
        experience.validate()?;
        Ok(experience)
    }

    /// Checks identity and timestamp consistency.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id.is_nil() {
            return Err(ModelValidationError::NilId);
        }
        check_timestamps(self.created_at_ms, self.updated_at_ms)?;

        let mut seen = HashSet::with_capacity(self.media.len());
        for record in &self.media {
            if record.id().is_nil() {
                return Err(ModelValidationError::NilId);
            }
            if !seen.insert(record.id()) {
                return Err(ModelValidationError::DuplicateMediaId(record.id()));
            }
            check_timestamps(record.created_at_ms(), record.updated_at_ms())?;
        }
        Ok(())
    }

    /// Appends a record at the end of the media sequence.
    pub fn append_media(&mut self, record: MediaRecord) -> MediaId {
        let id = record.id();
        self.media.push(record);
        id
    }

    /// Overwrites title and subtitle. The coordinate is left untouched.
    pub fn edit_metadata(
        &mut self,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        now_ms: i64,
    ) {
        self.title = Some(title.into());
        self.subtitle = Some(subtitle.into());
        self.touch(now_ms);
    }

    /// Moves the experience to a new coordinate.
    pub fn relocate(&mut self, coordinate: Coordinate, now_ms: i64) {
        self.coordinate = coordinate;
        self.touch(now_ms);
    }

    /// Overwrites title, subtitle and coordinate as one edit.
    pub fn update(
        &mut self,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
        now_ms: i64,
    ) {
        self.title = Some(title.into());
        self.subtitle = Some(subtitle.into());
        self.coordinate = coordinate;
        self.touch(now_ms);
    }

    /// Edits one owned media record in place.
    ///
    /// Returns `false` when no record with `media_id` belongs to this
    /// experience.
    pub fn mutate_media(
        &mut self,
        media_id: MediaId,
        reference: Option<String>,
        payload: Option<Vec<u8>>,
        now_ms: i64,
    ) -> bool {
        match self.media_mut(media_id) {
            Some(record) => {
                record.mutate(reference, payload, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn id(&self) -> ExperienceId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Media in append order.
    pub fn media_list(&self) -> &[MediaRecord] {
        &self.media
    }

    pub fn media(&self, media_id: MediaId) -> Option<&MediaRecord> {
        self.media.iter().find(|record| record.id() == media_id)
    }

    fn media_mut(&mut self, media_id: MediaId) -> Option<&mut MediaRecord> {
        self.media.iter_mut().find(|record| record.id() == media_id)
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn updated_at_ms(&self) -> Option<i64> {
        self.updated_at_ms
    }

    fn touch(&mut self, now_ms: i64) {
        self.updated_at_ms = Some(next_update_ms(
            self.created_at_ms,
            self.updated_at_ms,
            now_ms,
        ));
    }
}
