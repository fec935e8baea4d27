//! Experience use-case service.
//!
//! # Responsibility
//! - Create experiences and media from user input and route edits through
//!   the registry.
//! - Save/load registry snapshots through an `ExperienceRepository`.
//! - Log one metadata-only event per use-case.
//!
//! # Invariants
//! - The service never bypasses registry identity/ordering rules.
//! - Logs carry ids and counts only; titles and payload bytes stay out.

use crate::model::coordinate::Coordinate;
use crate::model::experience::{Experience, ExperienceId};
use crate::model::media::{infer_kind_from_reference, MediaId, MediaKind, MediaRecord};
use crate::registry::events::{RegistryObserver, SubscriptionId};
use crate::registry::experience_registry::{ExperienceRegistry, RegistryError};
use crate::repo::experience_repo::{ExperienceRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for experience use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Registry(RegistryError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Facade over one session registry and its snapshot storage.
pub struct ExperienceService<R: ExperienceRepository> {
    registry: ExperienceRegistry,
    repo: R,
}

impl<R: ExperienceRepository> ExperienceService<R> {
    /// Creates a service from an explicitly constructed registry.
    pub fn new(registry: ExperienceRegistry, repo: R) -> Self {
        Self { registry, repo }
    }

    /// Read access for rendering layers.
    pub fn registry(&self) -> &ExperienceRegistry {
        &self.registry
    }

    /// Creates and registers an experience at `coordinate`.
    pub fn create_experience(
        &mut self,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
    ) -> ServiceResult<ExperienceId> {
        let experience = Experience::new(title, subtitle, coordinate, self.registry.now_ms());
        let id = self.registry.add(experience)?;
        info!(
            "event=experience_create module=service status=ok experience_id={}",
            id
        );
        Ok(id)
    }

    /// Registers an experience built elsewhere (import, share sheet).
    pub fn import_experience(&mut self, experience: Experience) -> ServiceResult<ExperienceId> {
        let id = self.registry.add(experience).inspect_err(|err| {
            warn!(
                "event=experience_import module=service status=error error={}",
                err
            );
        })?;
        info!(
            "event=experience_import module=service status=ok experience_id={}",
            id
        );
        Ok(id)
    }

    /// Attaches a new media record to an experience.
    ///
    /// Empty records and kind/extension mismatches are accepted, but logged.
    pub fn add_media(
        &mut self,
        experience_id: ExperienceId,
        kind: MediaKind,
        reference: Option<String>,
        payload: Option<Vec<u8>>,
    ) -> ServiceResult<MediaId> {
        if reference.is_none() && payload.is_none() {
            warn!(
                "event=media_add module=service status=warn experience_id={} reason=empty_record",
                experience_id
            );
        }
        if let Some(inferred) = reference.as_deref().and_then(infer_kind_from_reference) {
            if inferred != kind {
                warn!(
                    "event=media_add module=service status=warn experience_id={} reason=kind_mismatch declared={} inferred={}",
                    experience_id,
                    kind.as_db_str(),
                    inferred.as_db_str()
                );
            }
        }

        let record = MediaRecord::new(kind, reference, payload, self.registry.now_ms());
        let scheme = match (record.reference(), record.reference_scheme()) {
            (None, _) => "none".to_string(),
            (Some(_), Some(scheme)) => scheme,
            (Some(_), None) => "path".to_string(),
        };
        let media_id = self.registry.append_media(experience_id, record)?;
        info!(
            "event=media_add module=service status=ok experience_id={} media_id={} kind={} scheme={}",
            experience_id,
            media_id,
            kind.as_db_str(),
            scheme
        );
        Ok(media_id)
    }

    /// Re-saves an edited asset into an existing media record.
    pub fn edit_media(
        &mut self,
        experience_id: ExperienceId,
        media_id: MediaId,
        reference: Option<String>,
        payload: Option<Vec<u8>>,
    ) -> ServiceResult<()> {
        self.registry
            .mutate_media(experience_id, media_id, reference, payload)?;
        info!(
            "event=media_edit module=service status=ok experience_id={} media_id={}",
            experience_id, media_id
        );
        Ok(())
    }

    pub fn edit_metadata(
        &mut self,
        experience_id: ExperienceId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> ServiceResult<()> {
        self.registry.edit_metadata(experience_id, title, subtitle)?;
        info!(
            "event=experience_edit module=service status=ok experience_id={}",
            experience_id
        );
        Ok(())
    }

    /// Updates title, subtitle and location together.
    pub fn update(
        &mut self,
        experience_id: ExperienceId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
    ) -> ServiceResult<()> {
        self.registry
            .update(experience_id, title, subtitle, coordinate)?;
        info!(
            "event=experience_update module=service status=ok experience_id={}",
            experience_id
        );
        Ok(())
    }

    pub fn relocate(
        &mut self,
        experience_id: ExperienceId,
        coordinate: Coordinate,
    ) -> ServiceResult<()> {
        self.registry.relocate(experience_id, coordinate)?;
        info!(
            "event=experience_relocate module=service status=ok experience_id={}",
            experience_id
        );
        Ok(())
    }

    pub fn remove(&mut self, experience_id: ExperienceId) -> ServiceResult<Experience> {
        let removed = self.registry.remove(experience_id)?;
        info!(
            "event=experience_remove module=service status=ok experience_id={} media_count={}",
            experience_id,
            removed.media_list().len()
        );
        Ok(removed)
    }

    /// All experiences in creation order.
    pub fn list(&self) -> Vec<&Experience> {
        self.registry.list()
    }

    pub fn get(&self, experience_id: ExperienceId) -> Option<&Experience> {
        self.registry.get(experience_id)
    }

    pub fn find_media(&self, media_id: MediaId) -> Option<(ExperienceId, &MediaRecord)> {
        self.registry.find_media(media_id)
    }

    pub fn search(&self, query: &str) -> Vec<&Experience> {
        self.registry.find_by_title(query)
    }

    pub fn subscribe(&mut self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
        self.registry.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    /// Writes the current registry content to storage.
    ///
    /// Returns the number of experiences saved.
    pub fn save(&self) -> ServiceResult<usize> {
        let experiences = self.registry.list();
        if let Err(err) = self.repo.save_all(&experiences) {
            warn!(
                "event=snapshot_save module=service status=error error={}",
                err
            );
            return Err(err.into());
        }
        info!(
            "event=snapshot_save module=service status=ok count={}",
            experiences.len()
        );
        Ok(experiences.len())
    }

    /// Replaces the registry content with the stored snapshot.
    ///
    /// On any error the registry keeps its previous content.
    pub fn load(&mut self) -> ServiceResult<usize> {
        let experiences = match self.repo.load_all() {
            Ok(experiences) => experiences,
            Err(err) => {
                warn!(
                    "event=snapshot_load module=service status=error error={}",
                    err
                );
                return Err(err.into());
            }
        };
        let count = experiences.len();
        self.registry.replace_all(experiences)?;
        info!(
            "event=snapshot_load module=service status=ok count={}",
            count
        );
        Ok(count)
    }
}
