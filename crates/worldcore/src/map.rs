//! `Map`: the entity registry, visibility root, and broadcast fan-out for
//! one region (spec §3 "Spatial", §4.5 "Map aggregate and visibility").

use std::collections::HashSet;

use geometry::Position2D;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    aoi::AoiGrid,
    entity::Entity,
    error::{CoreError, CoreResult},
    ids::{EntityId, MapId},
};

/// `entity_appear` payload (spec §4.5 "Broadcast payload types").
#[derive(Debug, Clone, Serialize)]
pub struct EntityAppear {
    pub id: EntityId,
    pub position3d: [f32; 3],
    pub direction3d: [f32; 3],
}

/// `entity_disappear` payload.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDisappear {
    pub id: EntityId,
}

/// `entity_move` payload.
#[derive(Debug, Clone, Serialize)]
pub struct EntityMove {
    pub id: EntityId,
    pub position3d: [f32; 3],
}

/// Non-blocking fan-out to one or more recipients on a named topic (spec
/// §6 "`BroadcastFn`"). Required topics: `entity_appear`, `entity_disappear`,
/// `entity_move`; higher layers may introduce more.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, recipients: &[EntityId], topic: &'static str, payload: serde_json::Value);
}

/// Required topic names (spec §6).
pub mod topics {
    pub const ENTITY_APPEAR: &str = "entity_appear";
    pub const ENTITY_DISAPPEAR: &str = "entity_disappear";
    pub const ENTITY_MOVE: &str = "entity_move";
}

fn to_vec3(p: glam::Vec3) -> [f32; 3] {
    [p.x, p.y, p.z]
}

/// The root aggregate for one region (spec §3 "Map").
///
/// Holds entities by value in a flat registry keyed by [`EntityId`] rather
/// than the AOI/Entity cross-references the original had (spec §9: "arena
/// + integer handles"). `Map` is the one type in this core permitted to
/// borrow two entities' data at once (e.g. to deliver a skill effect),
/// because it alone owns the registry both live in.
pub struct Map {
    pub id: MapId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub view_radius: f32,
    entities: FxHashMap<EntityId, Entity>,
    aoi: AoiGrid,
    visibility: FxHashMap<EntityId, HashSet<EntityId>>,
    broadcaster: Option<std::sync::Arc<dyn Broadcaster>>,
}

impl Map {
    #[must_use]
    pub fn new(id: MapId, name: String, width: f32, height: f32, cell_size: f32, view_radius: f32) -> Self {
        Self {
            id,
            name,
            width,
            height,
            view_radius,
            entities: FxHashMap::default(),
            aoi: AoiGrid::new(width, height, cell_size),
            visibility: FxHashMap::default(),
            broadcaster: None,
        }
    }

    pub fn set_broadcaster(&mut self, broadcaster: std::sync::Arc<dyn Broadcaster>) {
        self.broadcaster = Some(broadcaster);
    }

    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    #[must_use]
    pub fn get_all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities within `radius` of `position`. Uses the AOI grid's
    /// cell-superset result, so it is not an exact-radius filter unless
    /// the caller post-filters (spec §4.4).
    #[must_use]
    pub fn get_entities_in_range(&self, position: Position2D, radius: f32) -> Vec<EntityId> {
        self.aoi.nearby(position, radius)
    }

    #[must_use]
    pub fn visibility_set(&self, id: EntityId) -> Option<&HashSet<EntityId>> {
        self.visibility.get(&id)
    }

    /// Registers `entity`, rejecting duplicates (spec §4.5 `Enter`).
    #[tracing::instrument(skip(self, entity), fields(map = %self.id, entity = %entity.id))]
    pub fn enter(&mut self, mut entity: Entity) -> CoreResult<()> {
        let id = entity.id;
        if self.entities.contains_key(&id) {
            return Err(CoreError::EntityAlreadyPresent { id });
        }
        entity.set_map(Some(self.id));
        let position = entity.position2d();
        self.entities.insert(id, entity);
        self.aoi.add(id, position);
        self.visibility.insert(id, HashSet::new());
        self.refresh_visibility_for(id);
        debug!(registry_size = self.entities.len(), "entity entered map");
        Ok(())
    }

    /// Removes `id`, notifying every viewer that currently sees it (spec
    /// §4.5 `Leave`).
    #[tracing::instrument(skip(self), fields(map = %self.id))]
    pub fn leave(&mut self, id: EntityId) -> CoreResult<()> {
        if !self.entities.contains_key(&id) {
            return Err(CoreError::UnknownEntity { id });
        }
        self.aoi.remove(id);
        self.broadcast_disappear(id);
        self.entities.remove(&id);
        self.visibility.remove(&id);
        debug!(registry_size = self.entities.len(), "entity left map");
        Ok(())
    }

    fn broadcast_disappear(&mut self, id: EntityId) {
        let viewers: Vec<EntityId> = self
            .visibility
            .iter()
            .filter(|(viewer, seen)| **viewer != id && seen.contains(&id))
            .map(|(viewer, _)| *viewer)
            .collect();
        for viewer in &viewers {
            if let Some(seen) = self.visibility.get_mut(viewer) {
                seen.remove(&id);
            }
        }
        if let Some(broadcaster) = &self.broadcaster {
            if !viewers.is_empty() {
                let payload = serde_json::to_value(EntityDisappear { id }).unwrap_or(serde_json::Value::Null);
                broadcaster.broadcast(&viewers, topics::ENTITY_DISAPPEAR, payload);
            }
        }
    }

    /// Moves `id` to `new_position` and republishes its visibility set
    /// (spec §4.5 `UpdatePosition`).
    pub fn update_position(&mut self, id: EntityId, new_position: geometry::Transform) -> CoreResult<()> {
        let entity = self.entities.get_mut(&id).ok_or(CoreError::UnknownEntity { id })?;
        entity.set_transform(new_position);
        let position2d = entity.position2d();
        self.aoi.move_entity(id, position2d);
        self.refresh_visibility_for(id);
        self.broadcast_move(id, new_position.position);
        Ok(())
    }

    fn broadcast_move(&self, id: EntityId, position: glam::Vec3) {
        if let Some(broadcaster) = &self.broadcaster {
            let payload = serde_json::to_value(EntityMove {
                id,
                position3d: to_vec3(position),
            })
            .unwrap_or(serde_json::Value::Null);
            broadcaster.broadcast(&[id], topics::ENTITY_MOVE, payload);
        }
    }

    /// Recomputes `id`'s visibility set from the AOI grid and delivers the
    /// symmetric appear/disappear deltas (spec §4.5 `refreshVisibilityFor`).
    pub fn refresh_visibility_for(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        let position2d = entity.position2d();

        let new_set: HashSet<EntityId> = self
            .aoi
            .nearby(position2d, self.view_radius)
            .into_iter()
            .filter(|&other| other != id)
            .collect();

        let old_set = self.visibility.get(&id).cloned().unwrap_or_default();
        let appear: Vec<EntityId> = new_set.difference(&old_set).copied().collect();
        let disappear: Vec<EntityId> = old_set.difference(&new_set).copied().collect();

        trace!(appear = appear.len(), disappear = disappear.len(), "visibility refreshed");

        self.visibility.insert(id, new_set);
        for other in &appear {
            if let Some(seen) = self.visibility.get_mut(other) {
                seen.insert(id);
            }
        }
        for other in &disappear {
            if let Some(seen) = self.visibility.get_mut(other) {
                seen.remove(&id);
            }
        }

        let Some(broadcaster) = self.broadcaster.clone() else {
            return;
        };

        if !appear.is_empty() {
            let appear_payloads: Vec<serde_json::Value> = appear
                .iter()
                .filter_map(|other_id| self.entities.get(other_id))
                .map(|other| {
                    serde_json::to_value(EntityAppear {
                        id: other.id,
                        position3d: to_vec3(other.position()),
                        direction3d: to_vec3(other.transform().direction),
                    })
                    .unwrap_or(serde_json::Value::Null)
                })
                .collect();
            for payload in appear_payloads {
                broadcaster.broadcast(&[id], topics::ENTITY_APPEAR, payload);
            }

            if let Some(entity) = self.entities.get(&id) {
                let self_payload = serde_json::to_value(EntityAppear {
                    id,
                    position3d: to_vec3(entity.position()),
                    direction3d: to_vec3(entity.transform().direction),
                })
                .unwrap_or(serde_json::Value::Null);
                broadcaster.broadcast(&appear, topics::ENTITY_APPEAR, self_payload);
            }
        }

        if !disappear.is_empty() {
            let payload = serde_json::to_value(EntityDisappear { id }).unwrap_or(serde_json::Value::Null);
            broadcaster.broadcast(&disappear, topics::ENTITY_DISAPPEAR, payload);
        }
    }

    pub fn broadcast_in_range(&self, position: Position2D, radius: f32, topic: &'static str, payload: serde_json::Value) {
        let recipients = self.aoi.nearby(position, radius);
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(&recipients, topic, payload);
        }
    }

    pub fn broadcast_to(&self, recipients: &[EntityId], topic: &'static str, payload: serde_json::Value) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(recipients, topic, payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use geometry::Transform;
    use glam::Vec3;

    use super::*;
    use crate::ids::{EntityType, UnitId};

    #[derive(Default)]
    struct RecordingBroadcaster {
        sent: Mutex<Vec<(Vec<EntityId>, &'static str)>>,
    }

    impl Broadcaster for RecordingBroadcaster {
        fn broadcast(&self, recipients: &[EntityId], topic: &'static str, _payload: serde_json::Value) {
            self.sent.lock().unwrap().push((recipients.to_vec(), topic));
        }
    }

    fn entity(id: u32, pos: Vec3) -> Entity {
        Entity::new(EntityId::new(id), EntityType::Player, UnitId::new(1), Transform::at(pos))
    }

    fn map() -> Map {
        Map::new(MapId::new(1), "overworld".into(), 1000.0, 1000.0, 100.0, 200.0)
    }

    #[test]
    fn enter_rejects_duplicate() {
        let mut m = map();
        m.enter(entity(1, Vec3::ZERO)).unwrap();
        assert!(m.enter(entity(1, Vec3::ZERO)).is_err());
    }

    #[test]
    fn enter_then_leave_restores_empty_state() {
        let mut m = map();
        m.enter(entity(1, Vec3::ZERO)).unwrap();
        m.leave(EntityId::new(1)).unwrap();
        assert!(m.get_entity(EntityId::new(1)).is_none());
        assert!(m.visibility_set(EntityId::new(1)).is_none());
    }

    #[test]
    fn enter_symmetry_yields_mutual_appear() {
        let recorder = Arc::new(RecordingBroadcaster::default());
        let mut m = map();
        m.set_broadcaster(recorder.clone());
        m.enter(entity(1, Vec3::new(0.0, 0.0, 0.0))).unwrap();
        m.enter(entity(2, Vec3::new(0.0, 0.0, 150.0))).unwrap();

        let a_sees = m.visibility_set(EntityId::new(1)).unwrap();
        let b_sees = m.visibility_set(EntityId::new(2)).unwrap();
        assert!(a_sees.contains(&EntityId::new(2)));
        assert!(b_sees.contains(&EntityId::new(1)));
    }

    #[test]
    fn moving_out_of_range_triggers_mutual_disappear() {
        let mut m = map();
        m.enter(entity(1, Vec3::new(0.0, 0.0, 0.0))).unwrap();
        m.enter(entity(2, Vec3::new(0.0, 0.0, 150.0))).unwrap();
        m.update_position(EntityId::new(2), Transform::at(Vec3::new(0.0, 0.0, 500.0)))
            .unwrap();

        assert!(!m.visibility_set(EntityId::new(1)).unwrap().contains(&EntityId::new(2)));
        assert!(!m.visibility_set(EntityId::new(2)).unwrap().contains(&EntityId::new(1)));
    }

    #[test]
    fn appear_and_disappear_sets_never_overlap() {
        let mut m = map();
        m.enter(entity(1, Vec3::new(0.0, 0.0, 0.0))).unwrap();
        m.enter(entity(2, Vec3::new(0.0, 0.0, 150.0))).unwrap();
        m.enter(entity(3, Vec3::new(0.0, 0.0, 900.0))).unwrap();

        let seen = m.visibility_set(EntityId::new(1)).unwrap();
        assert!(seen.contains(&EntityId::new(2)));
        assert!(!seen.contains(&EntityId::new(3)));
    }
}

#[cfg(test)]
mod proptests {
    use geometry::Transform;
    use glam::Vec3;
    use proptest::prelude::*;

    use super::*;
    use crate::ids::{EntityType, UnitId};

    fn entity(id: u32, pos: Vec3) -> Entity {
        Entity::new(EntityId::new(id), EntityType::Player, UnitId::new(1), Transform::at(pos))
    }

    proptest! {
        /// Whenever `a` can see `b`, `b` can also see `a` (spec §8
        /// "visibility symmetry"): view radius is the same for every
        /// entity on a map, so "within range" is a symmetric relation.
        #[test]
        fn visibility_is_always_symmetric(
            ax in 0.0f32..1000.0, az in 0.0f32..1000.0,
            bx in 0.0f32..1000.0, bz in 0.0f32..1000.0,
        ) {
            let mut m = Map::new(MapId::new(1), "overworld".into(), 1000.0, 1000.0, 100.0, 200.0);
            m.enter(entity(1, Vec3::new(ax, 0.0, az))).unwrap();
            m.enter(entity(2, Vec3::new(bx, 0.0, bz))).unwrap();

            let a_sees_b = m.visibility_set(EntityId::new(1)).unwrap().contains(&EntityId::new(2));
            let b_sees_a = m.visibility_set(EntityId::new(2)).unwrap().contains(&EntityId::new(1));
            prop_assert_eq!(a_sees_b, b_sees_a);
        }
    }
}
