//! Repository ports consumed by the core (spec §6 "Consumed ports").
//!
//! None of these dictate a storage engine or wire format; the core only
//! needs the operations below, synchronously from the caller's point of
//! view, each taking a cancellation token.

use crate::{
    actor::Actor,
    entity::Entity,
    error::CoreResult,
    ids::{EntityId, EntityType, UnitId},
    monster::Monster,
    npc::Npc,
};

/// Cooperative cancellation signal threaded through every repository call
/// (spec §5 "every update method receives a cancellation context").
pub trait CancellationToken: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// A token that never cancels, for callers that don't need the feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// CRUD over generic entity records (spec §6).
pub trait EntityRepository: Send + Sync {
    fn register(&self, entity: &Entity, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn unregister(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn get(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<Option<Entity>>;
    fn get_by_type(&self, entity_type: EntityType, ct: &dyn CancellationToken) -> CoreResult<Vec<Entity>>;
}

/// Player-specific persistence (spec §6 `PlayerRepository`).
pub trait PlayerRepository: Send + Sync {
    fn save(&self, actor: &Actor, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn load(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<Option<Actor>>;
    fn delete(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn find_by_user_id(&self, user_id: &str, ct: &dyn CancellationToken) -> CoreResult<Option<Actor>>;
    fn exists_by_name(&self, name: &str, ct: &dyn CancellationToken) -> CoreResult<bool>;
}

/// Monster-specific persistence (spec §6 `MonsterRepository`).
pub trait MonsterRepository: Send + Sync {
    fn save(&self, monster: &Monster, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn load(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<Option<Monster>>;
    fn get_by_spawn_id(&self, spawn_id: u32, ct: &dyn CancellationToken) -> CoreResult<Vec<Monster>>;
    fn get_by_map_id(&self, map_id: crate::ids::MapId, ct: &dyn CancellationToken) -> CoreResult<Vec<Monster>>;
}

/// NPC-specific persistence (spec §6 `NPCRepository`).
pub trait NpcRepository: Send + Sync {
    fn save(&self, npc: &Npc, ct: &dyn CancellationToken) -> CoreResult<()>;
    fn load(&self, id: EntityId, ct: &dyn CancellationToken) -> CoreResult<Option<Npc>>;
    fn get_by_map_id(&self, map_id: crate::ids::MapId, ct: &dyn CancellationToken) -> CoreResult<Vec<Npc>>;
}

/// Static balancing/definition data keyed by [`UnitId`] (spec §6
/// `UnitDefineRepository`).
pub trait UnitDefineRepository: Send + Sync {
    fn get(&self, unit_id: UnitId, ct: &dyn CancellationToken) -> CoreResult<Option<UnitDefine>>;
    fn load_all(&self, ct: &dyn CancellationToken) -> CoreResult<Vec<UnitDefine>>;
}

/// A single static unit definition row: level-independent balancing inputs
/// the core folds into level-scaled base stats. Fields beyond this are an
/// implementation's own business and belong outside the core.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UnitDefine {
    pub unit_id: UnitId,
    pub base: crate::attribute::AttributeSet,
}
