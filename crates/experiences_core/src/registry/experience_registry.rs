//! Arena-style registry owning every experience of the session.
//!
//! Callers hold `ExperienceId` / `MediaId` values instead of references;
//! every read and edit is mediated by the registry, which keeps mutation
//! single-owner (`&mut self`) without shared interior mutability.

use super::events::{RegistryEvent, RegistryObserver, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::model::coordinate::Coordinate;
use crate::model::experience::{Experience, ExperienceId};
use crate::model::media::{MediaId, MediaRecord};
use crate::model::ModelValidationError;
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry lookup/consistency errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    ExperienceNotFound(ExperienceId),
    MediaNotFound {
        experience_id: ExperienceId,
        media_id: MediaId,
    },
    DuplicateExperience(ExperienceId),
    DuplicateMedia(MediaId),
    Validation(ModelValidationError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExperienceNotFound(id) => write!(f, "experience not found: {id}"),
            Self::MediaNotFound {
                experience_id,
                media_id,
            } => write!(
                f,
                "media {media_id} not found in experience {experience_id}"
            ),
            Self::DuplicateExperience(id) => write!(f, "experience already registered: {id}"),
            Self::DuplicateMedia(id) => write!(f, "media already registered: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RegistryError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Session-wide collection of experiences.
///
/// Construct one at process start and pass it (or a service wrapping it) to
/// every consumer.
pub struct ExperienceRegistry {
    clock: Arc<dyn Clock>,
    entries: HashMap<ExperienceId, Experience>,
    order: Vec<ExperienceId>,
    observers: BTreeMap<SubscriptionId, Arc<dyn RegistryObserver>>,
    next_subscription_id: u64,
}

impl Default for ExperienceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ExperienceRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: HashMap::new(),
            order: Vec::new(),
            observers: BTreeMap::new(),
            next_subscription_id: 1,
        }
    }

    /// Current time according to the injected clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: ExperienceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registers an experience at the end of the list.
    ///
    /// Identity is the only uniqueness rule: two experiences at the same
    /// coordinate with the same title are both kept.
    pub fn add(&mut self, experience: Experience) -> RegistryResult<ExperienceId> {
        experience.validate()?;
        let id = experience.id();
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateExperience(id));
        }
        if let Some(media_id) = experience
            .media_list()
            .iter()
            .map(MediaRecord::id)
            .find(|media_id| self.find_media(*media_id).is_some())
        {
            return Err(RegistryError::DuplicateMedia(media_id));
        }

        self.entries.insert(id, experience);
        self.order.push(id);
        debug!(
            "event=experience_add module=registry status=ok experience_id={} total={}",
            id,
            self.order.len()
        );
        self.emit(RegistryEvent::ExperienceAdded(id));
        Ok(id)
    }

    /// All experiences in insertion order.
    pub fn list(&self) -> Vec<&Experience> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Experience> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn get(&self, id: ExperienceId) -> Option<&Experience> {
        self.entries.get(&id)
    }

    /// Appends a media record to one experience.
    ///
    /// # Errors
    /// - `ExperienceNotFound` for unknown ids.
    /// - `DuplicateMedia` when the record id is already owned anywhere in the
    ///   registry.
    pub fn append_media(
        &mut self,
        experience_id: ExperienceId,
        record: MediaRecord,
    ) -> RegistryResult<MediaId> {
        if !self.entries.contains_key(&experience_id) {
            return Err(RegistryError::ExperienceNotFound(experience_id));
        }
        if record.id().is_nil() {
            return Err(ModelValidationError::NilId.into());
        }
        if self.find_media(record.id()).is_some() {
            return Err(RegistryError::DuplicateMedia(record.id()));
        }

        let kind = record.kind();
        let media_id = self.entry_mut(experience_id)?.append_media(record);
        debug!(
            "event=media_append module=registry status=ok experience_id={} media_id={} kind={}",
            experience_id,
            media_id,
            kind.as_db_str()
        );
        self.emit(RegistryEvent::MediaAppended {
            experience_id,
            media_id,
        });
        Ok(media_id)
    }

    /// Overwrites title/subtitle; the coordinate stays where it is.
    pub fn edit_metadata(
        &mut self,
        experience_id: ExperienceId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> RegistryResult<()> {
        let now_ms = self.now_ms();
        self.entry_mut(experience_id)?
            .edit_metadata(title, subtitle, now_ms);
        debug!(
            "event=experience_edit module=registry status=ok experience_id={}",
            experience_id
        );
        self.emit(RegistryEvent::ExperienceUpdated(experience_id));
        Ok(())
    }

    /// Moves one experience to a new coordinate.
    pub fn relocate(
        &mut self,
        experience_id: ExperienceId,
        coordinate: Coordinate,
    ) -> RegistryResult<()> {
        let now_ms = self.now_ms();
        self.entry_mut(experience_id)?.relocate(coordinate, now_ms);
        debug!(
            "event=experience_relocate module=registry status=ok experience_id={}",
            experience_id
        );
        self.emit(RegistryEvent::ExperienceUpdated(experience_id));
        Ok(())
    }

    /// Full metadata + location update, emitted as a single change.
    pub fn update(
        &mut self,
        experience_id: ExperienceId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
    ) -> RegistryResult<()> {
        let now_ms = self.now_ms();
        self.entry_mut(experience_id)?
            .update(title, subtitle, coordinate, now_ms);
        debug!(
            "event=experience_update module=registry status=ok experience_id={}",
            experience_id
        );
        self.emit(RegistryEvent::ExperienceUpdated(experience_id));
        Ok(())
    }

    /// Edits one media record in place (re-save of an edited asset).
    pub fn mutate_media(
        &mut self,
        experience_id: ExperienceId,
        media_id: MediaId,
        reference: Option<String>,
        payload: Option<Vec<u8>>,
    ) -> RegistryResult<()> {
        let now_ms = self.now_ms();
        let found = self
            .entry_mut(experience_id)?
            .mutate_media(media_id, reference, payload, now_ms);
        if !found {
            return Err(RegistryError::MediaNotFound {
                experience_id,
                media_id,
            });
        }
        debug!(
            "event=media_update module=registry status=ok experience_id={} media_id={}",
            experience_id, media_id
        );
        self.emit(RegistryEvent::MediaUpdated {
            experience_id,
            media_id,
        });
        Ok(())
    }

    /// Removes and returns one experience, keeping the order of the rest.
    pub fn remove(&mut self, experience_id: ExperienceId) -> RegistryResult<Experience> {
        let experience = self
            .entries
            .remove(&experience_id)
            .ok_or(RegistryError::ExperienceNotFound(experience_id))?;
        self.order.retain(|id| *id != experience_id);
        debug!(
            "event=experience_remove module=registry status=ok experience_id={} total={}",
            experience_id,
            self.order.len()
        );
        self.emit(RegistryEvent::ExperienceRemoved(experience_id));
        Ok(experience)
    }

    /// Finds a media record anywhere in the registry.
    pub fn find_media(&self, media_id: MediaId) -> Option<(ExperienceId, &MediaRecord)> {
        self.iter().find_map(|experience| {
            experience
                .media(media_id)
                .map(|record| (experience.id(), record))
        })
    }

    /// Case-insensitive substring match on titles, in insertion order.
    ///
    /// An empty (or whitespace-only) query matches nothing.
    pub fn find_by_title(&self, query: &str) -> Vec<&Experience> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.iter()
            .filter(|experience| {
                experience
                    .title()
                    .is_some_and(|title| title.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Replaces all content with `experiences`, keeping their order.
    ///
    /// The input is checked as a whole first; on error the registry is left
    /// untouched.
    pub fn replace_all(&mut self, experiences: Vec<Experience>) -> RegistryResult<()> {
        let mut experience_ids = HashSet::with_capacity(experiences.len());
        let mut media_ids = HashSet::new();
        for experience in &experiences {
            experience.validate()?;
            if !experience_ids.insert(experience.id()) {
                return Err(RegistryError::DuplicateExperience(experience.id()));
            }
            for record in experience.media_list() {
                if !media_ids.insert(record.id()) {
                    return Err(RegistryError::DuplicateMedia(record.id()));
                }
            }
        }

        self.order = experiences.iter().map(Experience::id).collect();
        self.entries = experiences
            .into_iter()
            .map(|experience| (experience.id(), experience))
            .collect();
        let count = self.order.len();
        debug!(
            "event=registry_reload module=registry status=ok total={}",
            count
        );
        self.emit(RegistryEvent::Reloaded { count });
        Ok(())
    }

    /// Registers an observer for all future change events.
    pub fn subscribe(&mut self, observer: Arc<dyn RegistryObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.observers.insert(id, observer);
        id
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    fn entry_mut(&mut self, experience_id: ExperienceId) -> RegistryResult<&mut Experience> {
        self.entries
            .get_mut(&experience_id)
            .ok_or(RegistryError::ExperienceNotFound(experience_id))
    }

    fn emit(&self, event: RegistryEvent) {
        for observer in self.observers.values() {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExperienceRegistry, RegistryError};
    use crate::clock::ManualClock;
    use crate::model::coordinate::Coordinate;
    use crate::model::experience::Experience;
    use crate::model::media::{MediaKind, MediaRecord};
    use std::sync::Arc;

    fn park() -> Experience {
        Experience::new(
            "Park",
            "Nice walk",
            Coordinate::new(40.0, -75.0).unwrap(),
            1_000,
        )
    }

    #[test]
    fn update_moves_and_renames_in_one_step() {
        let clock = Arc::new(ManualClock::new(2_000));
        let mut registry = ExperienceRegistry::new(clock);
        let id = registry.add(park()).unwrap();

        let target = Coordinate::new(41.5, -74.0).unwrap();
        registry.update(id, "Pier", "Windy", target).unwrap();

        let experience = registry.get(id).unwrap();
        assert_eq!(experience.title(), Some("Pier"));
        assert_eq!(experience.coordinate(), target);
        assert_eq!(experience.updated_at_ms(), Some(2_000));
    }

    #[test]
    fn append_rejects_media_already_owned_elsewhere() {
        let mut registry = ExperienceRegistry::default();
        let first = registry.add(park()).unwrap();
        let second = registry.add(park()).unwrap();

        let record = MediaRecord::new(MediaKind::Audio, Some("a.caf".into()), None, 1_000);
        registry.append_media(first, record.clone()).unwrap();

        let err = registry.append_media(second, record.clone()).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateMedia(record.id()));
        assert!(registry.get(second).unwrap().media_list().is_empty());
    }

    #[test]
    fn replace_all_is_atomic_on_duplicate_ids() {
        let mut registry = ExperienceRegistry::default();
        let kept = registry.add(park()).unwrap();

        let duplicate = park();
        let err = registry
            .replace_all(vec![duplicate.clone(), duplicate.clone()])
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateExperience(duplicate.id()));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(kept));
    }
}
