//! `EntityManager`: the process-wide id allocator (spec §4.7).

use parking_lot::RwLock;

use crate::{entity::Entity, ids::EntityId};

/// Monotonic [`EntityId`] allocator plus a concurrent registry (spec §4.7:
/// "monotonic ID allocator starting at 1000; concurrent-safe registry
/// mapping ID -> Entity").
///
/// Passed as an explicit construction-time dependency rather than a
/// singleton (spec §9): callers that want isolated worlds for testing
/// simply build their own instance.
pub struct EntityManager {
    next_id: std::sync::atomic::AtomicU32,
    registry: RwLock<rustc_hash::FxHashMap<EntityId, Entity>>,
}

impl EntityManager {
    const FIRST_ID: u32 = 1000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: std::sync::atomic::AtomicU32::new(Self::FIRST_ID),
            registry: RwLock::new(rustc_hash::FxHashMap::default()),
        }
    }

    /// Allocates the next [`EntityId`]. Never returns [`EntityId::INVALID`].
    pub fn allocate_id(&self) -> EntityId {
        let raw = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        EntityId::new(raw)
    }

    pub fn insert(&self, entity: Entity) {
        self.registry.write().insert(entity.id, entity);
    }

    pub fn remove(&self, id: EntityId) -> Option<Entity> {
        self.registry.write().remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.registry.read().get(&id).cloned()
    }

    pub fn with<R>(&self, id: EntityId, f: impl FnOnce(&Entity) -> R) -> Option<R> {
        self.registry.read().get(&id).map(f)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use geometry::Transform;
    use glam::Vec3;

    use super::*;
    use crate::ids::{EntityType, UnitId};

    #[test]
    fn allocation_starts_at_1000_and_is_monotonic() {
        let manager = EntityManager::new();
        let first = manager.allocate_id();
        let second = manager.allocate_id();
        assert_eq!(first.get(), 1000);
        assert_eq!(second.get(), 1001);
    }

    #[test]
    fn insert_and_remove_round_trips() {
        let manager = EntityManager::new();
        let id = manager.allocate_id();
        manager.insert(Entity::new(id, EntityType::Player, UnitId::new(1), Transform::at(Vec3::ZERO)));
        assert_eq!(manager.len(), 1);
        assert!(manager.remove(id).is_some());
        assert!(manager.is_empty());
    }
}
