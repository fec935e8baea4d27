//! Experience/media domain model.
//!
//! # Responsibility
//! - Define the aggregate (`Experience`) and its owned records (`MediaRecord`).
//! - Keep identity explicit through generated `ExperienceId` / `MediaId`.
//!
//! # Invariants
//! - Every experience and media record carries a non-nil UUID.
//! - `updated_at_ms`, when set, is never earlier than `created_at_ms` and
//!   strictly advances on every edit.
//! - An experience owns its media exclusively; records are never shared.

pub mod coordinate;
pub mod experience;
pub mod media;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for model values built from untrusted input.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    NilId,
    DuplicateMediaId(uuid::Uuid),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    UpdatedBeforeCreated {
        created_at_ms: i64,
        updated_at_ms: i64,
    },
    /// `i64::MAX` leaves no room for a later, strictly greater update time.
    TimestampAtLimit(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::DuplicateMediaId(id) => write!(f, "media id appears more than once: {id}"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude ({value}) must be a finite value in [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude ({value}) must be a finite value in [-180, 180]")
            }
            Self::UpdatedBeforeCreated {
                created_at_ms,
                updated_at_ms,
            } => write!(
                f,
                "updated_at ({updated_at_ms}) must be >= created_at ({created_at_ms})"
            ),
            Self::TimestampAtLimit(value) => {
                write!(f, "timestamp ({value}) must be below {}", i64::MAX)
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn check_timestamps(
    created_at_ms: i64,
    updated_at_ms: Option<i64>,
) -> Result<(), ModelValidationError> {
    if created_at_ms == i64::MAX {
        return Err(ModelValidationError::TimestampAtLimit(created_at_ms));
    }
    match updated_at_ms {
        Some(i64::MAX) => Err(ModelValidationError::TimestampAtLimit(i64::MAX)),
        Some(updated_at_ms) if updated_at_ms < created_at_ms => {
            Err(ModelValidationError::UpdatedBeforeCreated {
                created_at_ms,
                updated_at_ms,
            })
        }
        _ => Ok(()),
    }
}
