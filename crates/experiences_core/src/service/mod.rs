//! Core use-case services.
//!
//! # Responsibility
//! - Expose the entry points the presentation layer calls.
//! - Keep callers decoupled from registry bookkeeping and storage details.

pub mod experience_service;
