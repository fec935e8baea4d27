//! Time source abstraction.
//!
//! Core code reads "now" only through [`Clock`], so tests can pin time and
//! registries never depend on a process-global time source.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            // Clock set before 1970; report the negative offset.
            Err(err) => -i64::try_from(err.duration().as_millis()).unwrap_or(i64::MAX),
        }
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Computes the next `updated_at_ms` for an edited value.
///
/// The result is never below `created_at_ms` and always strictly above
/// `previous`, even when two edits share a millisecond or the wall clock
/// steps backwards. Inputs at `i64::MAX` saturate; model validation rejects
/// such timestamps before they reach a registry.
pub fn next_update_ms(created_at_ms: i64, previous: Option<i64>, now_ms: i64) -> i64 {
    let floor = match previous {
        Some(previous) => previous.saturating_add(1),
        None => created_at_ms,
    };
    now_ms.max(floor)
}
