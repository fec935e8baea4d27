//! Core domain logic for Experiences.
//! Owns the experience/media model, the session registry and snapshot storage;
//! presentation layers call in through `ExperienceService`.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::coordinate::Coordinate;
pub use model::experience::{Experience, ExperienceId, ExperienceParts};
pub use model::media::{
    infer_kind_from_reference, MediaId, MediaKind, MediaParts, MediaRecord,
};
pub use model::ModelValidationError;
pub use registry::events::{ChannelObserver, RegistryEvent, RegistryObserver, SubscriptionId};
pub use registry::experience_registry::{ExperienceRegistry, RegistryError, RegistryResult};
pub use repo::experience_repo::{
    ExperienceRepository, InMemoryExperienceRepository, RepoError, RepoResult,
    SqliteExperienceRepository,
};
pub use service::experience_service::{ExperienceService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
