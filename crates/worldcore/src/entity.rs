//! Base entity identity and transform (spec §3 "Entities", L1 "Entity"
//! layer).

use geometry::{Position2D, Transform};
use glam::Vec3;

use crate::ids::{EntityId, EntityType, MapId, UnitId};

/// Identity, transform, and validity shared by every live entity.
///
/// Design note (spec §9): rather than `Entity` holding opaque
/// back-references to its `Map`/AOI cell, it holds a typed, optional
/// [`MapId`] — the map itself is looked up through
/// [`crate::managers::EntityManager`]/[`crate::map::Map`], breaking the
/// cyclic-reference chain the original design had.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub unit_id: UnitId,
    transform: Transform,
    position2d: Position2D,
    valid: bool,
    map: Option<MapId>,
}

impl Entity {
    #[must_use]
    pub fn new(id: EntityId, entity_type: EntityType, unit_id: UnitId, transform: Transform) -> Self {
        let position2d = transform.position2d();
        Self {
            id,
            entity_type,
            unit_id,
            transform,
            position2d,
            valid: true,
            map: None,
        }
    }

    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    #[must_use]
    pub const fn position2d(&self) -> Position2D {
        self.position2d
    }

    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Writes a new transform and its cached 2D projection together, so a
    /// single read (under the caller's lock) always observes a consistent
    /// pair (spec §5: "reading `transform` and `position2D` together
    /// yields a consistent pair").
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.position2d = transform.position2d();
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    #[must_use]
    pub const fn map(&self) -> Option<MapId> {
        self.map
    }

    pub fn set_map(&mut self, map: Option<MapId>) {
        self.map = map;
    }
}
