//! In-memory experience registry and change notifications.
//!
//! # Responsibility
//! - Own every experience of the session; all reads/edits go through ids.
//! - Notify subscribers after each successful mutation.
//!
//! # Invariants
//! - `list()` order equals insertion order.
//! - No two entries share an `ExperienceId`; coordinates/titles may repeat.
//! - Observers only see events for mutations that actually happened.

pub mod events;
pub mod experience_registry;
