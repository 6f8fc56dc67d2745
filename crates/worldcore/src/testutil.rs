//! In-memory port implementations for tests (SPEC_FULL.md §0).
//!
//! None of these belong in a production binary; they exist so both this
//! crate's own tests and a downstream implementation's integration tests
//! can exercise the core without standing up real persistence, a real
//! transport, or a real event sink.

use std::sync::Mutex;

use crate::{
    events::{DomainEvent, EventPublisher},
    ids::EntityId,
    map::Broadcaster,
};

/// An [`EventPublisher`] that records every event it receives, in order.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("poisoned lock").clone()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().expect("poisoned lock").iter().map(|e| e.name).collect()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().expect("poisoned lock").push(event);
    }
}

/// A [`Broadcaster`] that records every fan-out call instead of sending
/// anything over a transport.
#[derive(Default)]
pub struct InMemoryBroadcaster {
    sent: Mutex<Vec<(Vec<EntityId>, &'static str, serde_json::Value)>>,
}

impl InMemoryBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<(Vec<EntityId>, &'static str, serde_json::Value)> {
        self.sent.lock().expect("poisoned lock").clone()
    }

    #[must_use]
    pub fn count_for_topic(&self, topic: &str) -> usize {
        self.sent
            .lock()
            .expect("poisoned lock")
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .count()
    }
}

impl Broadcaster for InMemoryBroadcaster {
    fn broadcast(&self, recipients: &[EntityId], topic: &'static str, payload: serde_json::Value) {
        self.sent.lock().expect("poisoned lock").push((recipients.to_vec(), topic, payload));
    }
}
