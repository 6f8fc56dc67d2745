//! `Missile`: a projectile travelling from caster to target (spec §3
//! "Missile", §4.3 "Missile travel").

use geometry::distance2d;
use glam::Vec3;

use crate::{
    entity::Entity,
    ids::{EntityId, SkillId},
};

/// Where a missile is aimed: a fixed point, or a tracked entity whose
/// position is resolved fresh every tick (spec §4.3: "entity-targeted
/// missiles follow their target; point-targeted missiles do not").
#[derive(Debug, Clone, Copy)]
pub enum MissileTarget {
    Point(Vec3),
    Entity(EntityId),
}

/// The outcome of one [`Missile::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissileOutcome {
    /// Still travelling.
    Flying,
    /// Reached its target this tick; the caller should apply the skill's
    /// effect and then despawn it.
    Hit,
    /// Exceeded its time-to-live without reaching the target; the caller
    /// should despawn it without applying any effect.
    Expired,
}

/// A projectile spawned by a skill cast (spec §3 "Missile").
pub struct Missile {
    pub entity: Entity,
    pub caster: EntityId,
    pub target: MissileTarget,
    pub skill_id: SkillId,
    pub speed: f32,
    ttl: f32,
    elapsed: f32,
    traveled: f32,
}

impl Missile {
    #[must_use]
    pub fn new(entity: Entity, caster: EntityId, target: MissileTarget, skill_id: SkillId, speed: f32, ttl: f32) -> Self {
        Self {
            entity,
            caster,
            target,
            skill_id,
            speed,
            ttl,
            elapsed: 0.0,
            traveled: 0.0,
        }
    }

    #[must_use]
    pub const fn traveled(&self) -> f32 {
        self.traveled
    }

    /// Advances the missile in a straight line toward `target_position`
    /// (the caller resolves [`MissileTarget::Entity`] to a live position;
    /// this type never reaches into a registry itself) (spec §4.3:
    /// "straight-line travel at constant speed").
    ///
    /// Hit radius is fixed at `0.5` world units (spec §9, ambiguous
    /// behavior 5: the spec leaves the exact hit radius unspecified).
    pub fn update(&mut self, dt: f32, target_position: Vec3) -> MissileOutcome {
        const HIT_RADIUS: f32 = 0.5;

        self.elapsed += dt;
        if self.elapsed > self.ttl {
            return MissileOutcome::Expired;
        }

        let current = self.entity.position();
        let remaining = target_position - current;
        let distance_to_target = distance2d(current, target_position);

        if distance_to_target <= HIT_RADIUS {
            return MissileOutcome::Hit;
        }

        let step = self.speed * dt;
        let direction = remaining.normalize_or_zero();
        let next = if step >= distance_to_target {
            target_position
        } else {
            current + direction * step
        };

        self.traveled += distance2d(current, next);
        self.entity
            .set_transform(geometry::Transform::new(next, direction));

        if distance2d(next, target_position) <= HIT_RADIUS {
            MissileOutcome::Hit
        } else {
            MissileOutcome::Flying
        }
    }
}

#[cfg(test)]
mod tests {
    use geometry::Transform;

    use super::*;
    use crate::ids::{EntityType, UnitId};

    fn missile(speed: f32, ttl: f32) -> Missile {
        let entity = Entity::new(EntityId::new(10), EntityType::Missile, UnitId::new(1), Transform::at(Vec3::ZERO));
        Missile::new(entity, EntityId::new(1), MissileTarget::Point(Vec3::new(10.0, 0.0, 0.0)), SkillId::new(1), speed, ttl)
    }

    #[test]
    fn travels_toward_target_each_tick() {
        let mut m = missile(5.0, 10.0);
        let outcome = m.update(1.0, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(outcome, MissileOutcome::Flying);
        assert!((m.entity.position().x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn reaching_target_yields_hit() {
        let mut m = missile(100.0, 10.0);
        let outcome = m.update(1.0, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(outcome, MissileOutcome::Hit);
    }

    #[test]
    fn exceeding_ttl_without_arrival_expires() {
        let mut m = missile(0.01, 0.5);
        let outcome = m.update(1.0, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(outcome, MissileOutcome::Expired);
    }
}
