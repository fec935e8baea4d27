//! Snapshot persistence for the experience registry.
//!
//! # Responsibility
//! - Define the storage contract the service saves to and loads from.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - `save_all` replaces the stored snapshot atomically.
//! - `load_all` returns experiences and media in their saved order.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod experience_repo;
