//! Registry change events and subscriber plumbing.

use crate::model::experience::ExperienceId;
use crate::model::media::MediaId;
use std::sync::mpsc::{self, Receiver, Sender};

/// Change notification emitted after a registry mutation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    ExperienceAdded(ExperienceId),
    /// Title/subtitle and/or coordinate changed.
    ExperienceUpdated(ExperienceId),
    ExperienceRemoved(ExperienceId),
    MediaAppended {
        experience_id: ExperienceId,
        media_id: MediaId,
    },
    MediaUpdated {
        experience_id: ExperienceId,
        media_id: MediaId,
    },
    /// Registry content was replaced wholesale (e.g. loaded from storage).
    Reloaded { count: usize },
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Receiver of registry change events.
///
/// Called synchronously on the mutating thread, after the change is visible.
pub trait RegistryObserver: Send + Sync {
    fn on_event(&self, event: &RegistryEvent);
}

/// Observer that forwards every event into an mpsc channel.
pub struct ChannelObserver {
    sender: Sender<RegistryEvent>,
}

impl ChannelObserver {
    /// Creates an observer plus the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<RegistryEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl RegistryObserver for ChannelObserver {
    fn on_event(&self, event: &RegistryEvent) {
        // A dropped receiver only means nobody listens anymore.
        let _ = self.sender.send(*event);
    }
}
