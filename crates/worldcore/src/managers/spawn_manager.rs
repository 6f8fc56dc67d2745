//! `SpawnManager`: spawn-point registry and respawn timers (spec §4.7).

use glam::Vec3;

use crate::ids::{EntityId, MapId, UnitId};

/// A factory invoked when a spawn point's respawn timer elapses. Kept
/// generic over the produced value so this core doesn't need to know
/// whether `T` is an [`crate::actor::Actor`], a [`crate::monster::Monster`],
/// or something a higher layer defines.
pub trait SpawnFactory<T>: Send + Sync {
    fn create(&self, point: &SpawnPoint) -> T;
}

/// A parameterized entity factory tied to a map position (spec §3 "Spawn
/// point", §4.7 `SpawnManager`).
#[derive(Debug, Clone, Copy)]
pub struct SpawnPoint {
    pub id: u32,
    pub map_id: MapId,
    pub unit_define_id: UnitId,
    pub position: Vec3,
    pub respawn_time: f32,
    pub max_count: u32,
    current_count: u32,
    respawn_timer: f32,
}

impl SpawnPoint {
    #[must_use]
    pub const fn new(id: u32, map_id: MapId, unit_define_id: UnitId, position: Vec3, respawn_time: f32, max_count: u32) -> Self {
        Self {
            id,
            map_id,
            unit_define_id,
            position,
            respawn_time,
            max_count,
            current_count: 0,
            respawn_timer: 0.0,
        }
    }

    #[must_use]
    pub const fn current_count(&self) -> u32 {
        self.current_count
    }
}

/// Drives every registered [`SpawnPoint`]'s respawn timer (spec §4.7:
/// "per tick, for every spawn point with currentCount < maxCount, advance
/// a respawn timer and create a new entity via a factory interface when
/// it elapses").
pub struct SpawnManager<T> {
    points: Vec<SpawnPoint>,
    produced: Vec<(u32, EntityId)>,
    factory: Box<dyn SpawnFactory<T>>,
}

impl<T> SpawnManager<T> {
    #[must_use]
    pub fn new(factory: Box<dyn SpawnFactory<T>>) -> Self {
        Self {
            points: Vec::new(),
            produced: Vec::new(),
            factory,
        }
    }

    pub fn register(&mut self, point: SpawnPoint) {
        self.points.push(point);
    }

    /// Advances every spawn point by `dt`. Returns the entities created
    /// this tick alongside the spawn point id that produced them; the
    /// caller is responsible for assigning them an [`EntityId`] and
    /// calling [`SpawnManager::on_entity_destroyed`] once any of them die.
    pub fn update(&mut self, dt: f32) -> Vec<(u32, T)> {
        let mut spawned = Vec::new();
        for point in &mut self.points {
            if point.current_count >= point.max_count {
                continue;
            }
            point.respawn_timer += dt;
            if point.respawn_timer >= point.respawn_time {
                point.respawn_timer -= point.respawn_time;
                point.current_count += 1;
                spawned.push((point.id, self.factory.create(point)));
            }
        }
        spawned
    }

    /// Reduces the owning spawn point's count and clears its reserved
    /// slot so the next [`SpawnManager::update`] call may refill it (spec
    /// §4.7 `OnEntityDestroyed`).
    pub fn on_entity_destroyed(&mut self, spawn_id: u32) {
        if let Some(point) = self.points.iter_mut().find(|p| p.id == spawn_id) {
            point.current_count = point.current_count.saturating_sub(1);
        }
        self.produced.retain(|(id, _)| *id != spawn_id);
    }

    #[must_use]
    pub fn points(&self) -> &[SpawnPoint] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UnitFactory;

    impl SpawnFactory<()> for UnitFactory {
        fn create(&self, _point: &SpawnPoint) {}
    }

    fn manager() -> SpawnManager<()> {
        SpawnManager::new(Box::new(UnitFactory))
    }

    #[test]
    fn spawns_up_to_max_count_over_time() {
        let mut mgr = manager();
        mgr.register(SpawnPoint::new(1, MapId::new(1), UnitId::new(1), Vec3::ZERO, 5.0, 2));

        let mut spawned_total = 0;
        for _ in 0..20 {
            spawned_total += mgr.update(0.5).len();
        }
        assert_eq!(spawned_total, 2);
    }

    #[test]
    fn destroyed_entity_allows_another_spawn() {
        let mut mgr = manager();
        mgr.register(SpawnPoint::new(1, MapId::new(1), UnitId::new(1), Vec3::ZERO, 5.0, 1));

        for _ in 0..10 {
            mgr.update(0.5);
        }
        assert_eq!(mgr.points()[0].current_count(), 1);

        mgr.on_entity_destroyed(1);
        assert_eq!(mgr.points()[0].current_count(), 0);

        let mut spawned_again = false;
        for _ in 0..10 {
            if !mgr.update(0.5).is_empty() {
                spawned_again = true;
            }
        }
        assert!(spawned_again);
    }
}
