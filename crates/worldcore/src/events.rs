//! Domain events and the publisher port (spec §6 "Consumed ports").

use std::time::Duration;

use serde::Serialize;

use crate::ids::EntityId;

/// A past-tense, immutable record emitted by the core (spec GLOSSARY).
///
/// `timestamp` is expressed as a monotonic duration since an
/// implementation-defined epoch rather than a wall-clock type, so the core
/// never needs to read the system clock (kept deterministic and testable).
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub name: &'static str,
    pub timestamp: Duration,
    pub aggregate_id: EntityId,
    pub payload: serde_json::Value,
}

impl DomainEvent {
    #[must_use]
    pub fn new(name: &'static str, timestamp: Duration, aggregate_id: EntityId, payload: impl Serialize) -> Self {
        Self {
            name,
            timestamp,
            aggregate_id,
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Required event names (spec §6).
pub mod event_names {
    pub const ENTITY_CREATED: &str = "EntityCreated";
    pub const ENTITY_DESTROYED: &str = "EntityDestroyed";
    pub const PLAYER_CREATED: &str = "PlayerCreated";
    pub const PLAYER_LEVEL_UP: &str = "PlayerLevelUp";
    pub const PLAYER_DEATH: &str = "PlayerDeath";
    pub const DAMAGE_DEALT: &str = "DamageDealt";
    pub const SKILL_CAST: &str = "SkillCast";
    pub const BUFF_ADDED: &str = "BuffAdded";
    pub const BUFF_REMOVED: &str = "BuffRemoved";
    pub const MONSTER_DEATH: &str = "MonsterDeath";
}

/// Non-blocking delivery of a [`DomainEvent`] to an external subscriber
/// (persistence, telemetry, social systems).
///
/// Implementations must not block the scheduler loop; a slow or failing
/// sink is an infrastructure failure (spec §7, kind 3) and is the
/// implementation's responsibility to shed load, not the core's.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// An [`EventPublisher`] that discards every event. The default when an
/// actor is constructed without an explicit publisher attached.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: DomainEvent) {}
}
