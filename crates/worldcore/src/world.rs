//! `World`: the per-tick orchestration that wires the map, actors,
//! monsters, and missiles into the flow spec §2 describes: "the scheduler
//! fires, a map-or-manager callback runs `update(dt)`, each actor ticks
//! its skill FSM, monsters additionally tick their AI FSM, missiles
//! advance and resolve hits."
//!
//! The other modules in this crate are deliberately decoupled from each
//! other — [`crate::actor::Actor::resolve_skill_effect`] computes damage
//! but leaves delivery to "the caller (the map/scheduler)"; [`crate::monster::Monster`]
//! decides when to cast but never calls [`crate::actor::Actor::cast`] itself.
//! `World` is that caller: the one type, besides `Map` itself, allowed to
//! hold multiple entities' data at once, because it alone owns every
//! collection they live in.

use std::{sync::Arc, time::Duration};

use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    actor::Actor,
    entity::Entity,
    error::CoreResult,
    events::{event_names, DomainEvent, EventPublisher, NullPublisher},
    ids::{EntityId, EntityType, SkillId},
    map::Map,
    missile::{Missile, MissileOutcome, MissileTarget},
    monster::{AiState, Monster},
    npc::Npc,
    spell::{DamageInfo, NeverCrit},
};

#[derive(Debug, Serialize)]
struct EntityCreatedPayload {
    entity_type: EntityType,
}

/// Owns everything live on one [`Map`] and runs the per-tick update flow
/// that ties the combat, AI, and projectile subsystems together (spec §2).
///
/// `Actor`/`Monster`/`Missile` each carry their own [`Entity`] copy (spec
/// §9 composition-over-inheritance), while `Map` separately holds the
/// authoritative registry used for visibility and spatial queries. `World`
/// always reads position from `self.map`, never from an actor's own
/// embedded entity, to avoid the two copies drifting apart.
pub struct World {
    pub map: Map,
    actors: FxHashMap<EntityId, Actor>,
    monsters: FxHashMap<EntityId, Monster>,
    npcs: FxHashMap<EntityId, Npc>,
    missiles: FxHashMap<EntityId, Missile>,
    publisher: Arc<dyn EventPublisher>,
}

impl World {
    #[must_use]
    pub fn new(map: Map) -> Self {
        Self {
            map,
            actors: FxHashMap::default(),
            monsters: FxHashMap::default(),
            npcs: FxHashMap::default(),
            missiles: FxHashMap::default(),
            publisher: Arc::new(NullPublisher),
        }
    }

    pub fn set_publisher(&mut self, publisher: Arc<dyn EventPublisher>) {
        self.publisher = publisher;
    }

    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actor_ref(id)
    }

    #[must_use]
    pub fn monster(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    #[must_use]
    pub fn npc(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    #[must_use]
    pub fn missile(&self, id: EntityId) -> Option<&Missile> {
        self.missiles.get(&id)
    }

    fn actor_ref(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id).or_else(|| self.monsters.get(&id).map(|monster| &monster.actor))
    }

    fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        if self.actors.contains_key(&id) {
            self.actors.get_mut(&id)
        } else {
            self.monsters.get_mut(&id).map(|monster| &mut monster.actor)
        }
    }

    /// Registers a player actor, publishing `EntityCreated` and
    /// `PlayerCreated` (spec §6).
    pub fn spawn_player(&mut self, mut actor: Actor, now: Duration) -> CoreResult<EntityId> {
        actor.set_publisher(self.publisher.clone());
        let id = actor.entity.id;
        self.map.enter(actor.entity.clone())?;
        self.actors.insert(id, actor);
        self.publish_created(id, EntityType::Player, now);
        self.publisher.publish(DomainEvent::new(event_names::PLAYER_CREATED, now, id, ()));
        Ok(id)
    }

    /// Registers a monster, publishing `EntityCreated`.
    pub fn spawn_monster(&mut self, mut monster: Monster, now: Duration) -> CoreResult<EntityId> {
        monster.actor.set_publisher(self.publisher.clone());
        let id = monster.actor.entity.id;
        self.map.enter(monster.actor.entity.clone())?;
        self.monsters.insert(id, monster);
        self.publish_created(id, EntityType::Monster, now);
        Ok(id)
    }

    /// Registers an NPC, publishing `EntityCreated`.
    pub fn spawn_npc(&mut self, npc: Npc, now: Duration) -> CoreResult<EntityId> {
        let id = npc.entity.id;
        self.map.enter(npc.entity.clone())?;
        self.npcs.insert(id, npc);
        self.publish_created(id, EntityType::Npc, now);
        Ok(id)
    }

    /// Registers a missile so it participates in visibility and per-tick
    /// travel, publishing `EntityCreated`.
    pub fn spawn_missile(&mut self, missile: Missile, now: Duration) -> CoreResult<EntityId> {
        let id = missile.entity.id;
        self.map.enter(missile.entity.clone())?;
        self.missiles.insert(id, missile);
        self.publish_created(id, EntityType::Missile, now);
        Ok(id)
    }

    fn publish_created(&self, id: EntityId, entity_type: EntityType, now: Duration) {
        self.publisher.publish(DomainEvent::new(
            event_names::ENTITY_CREATED,
            now,
            id,
            EntityCreatedPayload { entity_type },
        ));
    }

    /// Removes any entity kind from both the map and this world, publishing
    /// `EntityDestroyed` (spec §6).
    pub fn despawn(&mut self, id: EntityId, now: Duration) -> CoreResult<()> {
        self.map.leave(id)?;
        self.actors.remove(&id);
        self.monsters.remove(&id);
        self.npcs.remove(&id);
        self.missiles.remove(&id);
        self.publisher.publish(DomainEvent::new(event_names::ENTITY_DESTROYED, now, id, ()));
        Ok(())
    }

    /// Runs one tick: actor subsystems, monster AI, skill-effect delivery,
    /// and missile travel, in the order spec §2's "data/control flow each
    /// tick" prescribes. Intended to be driven from a
    /// [`crate::scheduler::Scheduler`] callback once per map per tick.
    #[tracing::instrument(skip(self), fields(map = %self.map.id))]
    pub fn tick(&mut self, dt: f32, now: Duration) {
        let mut activations = Vec::new();
        self.tick_players(dt, now, &mut activations);
        self.tick_monsters(dt, now, &mut activations);
        self.resolve_activations(&activations, now);
        self.advance_missiles(dt, now);
    }

    fn tick_players(&mut self, dt: f32, now: Duration, activations: &mut Vec<(EntityId, SkillId, EntityId)>) {
        let ids: Vec<EntityId> = self.actors.keys().copied().collect();
        for id in ids {
            let Some(actor) = self.actors.get_mut(&id) else { continue };
            let activated = actor.update(dt, now);
            if activated.is_empty() {
                continue;
            }
            if let Some(target) = actor.spell.current_target() {
                activations.extend(activated.into_iter().map(|skill_id| (id, skill_id, target)));
            }
        }
    }

    fn tick_monsters(&mut self, dt: f32, now: Duration, activations: &mut Vec<(EntityId, SkillId, EntityId)>) {
        let ids: Vec<EntityId> = self.monsters.keys().copied().collect();
        for id in ids {
            let own_position = self
                .map
                .get_entity(id)
                .map(Entity::position)
                .unwrap_or(self.monsters[&id].spawn_point);
            let scan_radius = {
                let config = &self.monsters[&id].config;
                config.aggro_range.max(config.leash_range)
            };
            let nearest = self.nearest_hostile(own_position, scan_radius);

            let Some(monster) = self.monsters.get_mut(&id) else { continue };
            let was_dead = monster.state() == AiState::Death;
            let activated = monster.actor.update(dt, now);
            monster.update_ai(dt, own_position, nearest);

            if !activated.is_empty() {
                if let Some(target) = monster.actor.spell.current_target() {
                    activations.extend(activated.into_iter().map(|skill_id| (id, skill_id, target)));
                }
            }

            if monster.state() == AiState::Goback {
                self.step_toward_spawn(id, own_position, dt);
            }

            if let Some(target) = monster.take_pending_cast() {
                let attack_skill = monster.config.attack_skill;
                let _ = monster.actor.cast(attack_skill, target, now);
            }

            if !was_dead && monster.state() == AiState::Death {
                self.publisher.publish(DomainEvent::new(event_names::MONSTER_DEATH, now, id, ()));
            }
        }
    }

    fn step_toward_spawn(&mut self, id: EntityId, own_position: Vec3, dt: f32) {
        let Some(monster) = self.monsters.get(&id) else { return };
        let max_step = monster.actor.speed().max(0.1) * dt;
        let remaining = monster.spawn_point - own_position;
        let distance = geometry::distance2d(own_position, monster.spawn_point);
        let next = if distance <= max_step {
            monster.spawn_point
        } else {
            own_position + remaining.normalize_or_zero() * max_step
        };
        let facing = remaining.normalize_or_zero();
        let transform = geometry::Transform::new(next, if facing == Vec3::ZERO { Vec3::Z } else { facing });
        let _ = self.map.update_position(id, transform);
    }

    /// The closest living player within `radius` of `from`, supplied to
    /// [`Monster::update_ai`] each tick. The monster's own AI never scans
    /// the world directly (spec §4.2: "supplied by the map layer").
    fn nearest_hostile(&self, from: Vec3, radius: f32) -> Option<(EntityId, Vec3)> {
        let position2d = geometry::Position2D::from(from);
        let mut best: Option<(EntityId, Vec3, f32)> = None;
        for id in self.map.get_entities_in_range(position2d, radius) {
            let Some(entity) = self.map.get_entity(id) else { continue };
            if entity.entity_type != EntityType::Player {
                continue;
            }
            let Some(actor) = self.actors.get(&id) else { continue };
            if actor.is_death() {
                continue;
            }
            let position = entity.position();
            let dist2 = geometry::distance2d_squared(from, position);
            if best.map_or(true, |(_, _, best_dist)| dist2 < best_dist) {
                best = Some((id, position, dist2));
            }
        }
        best.map(|(id, position, _)| (id, position))
    }

    fn resolve_activations(&mut self, activations: &[(EntityId, SkillId, EntityId)], now: Duration) {
        for &(source_id, skill_id, target_id) in activations {
            let Some(defender_finals) = self.actor_ref(target_id).map(|actor| *actor.finals()) else {
                continue;
            };
            let Some(info) = self
                .actor_ref(source_id)
                .and_then(|source| source.resolve_skill_effect(skill_id, &defender_finals, &mut NeverCrit))
            else {
                continue;
            };
            self.apply_damage(target_id, info, now);
        }
    }

    /// Delivers a resolved [`DamageInfo`] to its target: updates HP,
    /// interrupts monster AI via `on_hurt`, and publishes the death event
    /// on the tick it actually occurs.
    fn apply_damage(&mut self, target_id: EntityId, info: DamageInfo, now: Duration) {
        let was_alive = self.actor_ref(target_id).map_or(false, |actor| !actor.is_death());
        let Some(defender) = self.actor_mut(target_id) else { return };
        defender.on_hurt(info, now);

        if let Some(monster) = self.monsters.get_mut(&target_id) {
            monster.on_hurt(info.source);
        }

        let now_dead = self.actor_ref(target_id).map_or(false, Actor::is_death);
        if was_alive && now_dead {
            let event = if self.monsters.contains_key(&target_id) {
                event_names::MONSTER_DEATH
            } else {
                event_names::PLAYER_DEATH
            };
            self.publisher.publish(DomainEvent::new(event, now, target_id, ()));
        }
    }

    fn advance_missiles(&mut self, dt: f32, now: Duration) {
        let ids: Vec<EntityId> = self.missiles.keys().copied().collect();
        for id in ids {
            let target_position = match self.missiles.get(&id).map(|missile| missile.target) {
                Some(MissileTarget::Point(point)) => point,
                Some(MissileTarget::Entity(target_id)) => match self.map.get_entity(target_id) {
                    Some(entity) => entity.position(),
                    None => {
                        self.remove_missile(id, now);
                        continue;
                    }
                },
                None => continue,
            };

            let Some(missile) = self.missiles.get_mut(&id) else { continue };
            let outcome = missile.update(dt, target_position);
            let transform = missile.entity.transform();
            let _ = self.map.update_position(id, transform);

            match outcome {
                MissileOutcome::Flying => {}
                MissileOutcome::Hit => {
                    self.resolve_missile_hit(id, now);
                    self.remove_missile(id, now);
                }
                MissileOutcome::Expired => {
                    self.remove_missile(id, now);
                }
            }
        }
    }

    /// Point-targeted missiles (ground-targeted AOE, never implemented
    /// beyond travel in this core) carry no defender to deliver damage to;
    /// only entity-targeted hits resolve an effect.
    fn resolve_missile_hit(&mut self, missile_id: EntityId, now: Duration) {
        let Some(missile) = self.missiles.get(&missile_id) else { return };
        let caster_id = missile.caster;
        let skill_id = missile.skill_id;
        let MissileTarget::Entity(target_id) = missile.target else {
            return;
        };
        let Some(defender_finals) = self.actor_ref(target_id).map(|actor| *actor.finals()) else {
            return;
        };
        let Some(info) = self
            .actor_ref(caster_id)
            .and_then(|source| source.resolve_skill_effect(skill_id, &defender_finals, &mut NeverCrit))
        else {
            return;
        };
        self.apply_damage(target_id, info, now);
    }

    fn remove_missile(&mut self, id: EntityId, now: Duration) {
        self.missiles.remove(&id);
        let _ = self.map.leave(id);
        self.publisher.publish(DomainEvent::new(event_names::ENTITY_DESTROYED, now, id, ()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use geometry::Transform;

    use super::*;
    use crate::{
        attribute::AttributeSet,
        ids::UnitId,
        map::Map,
        monster::MonsterAiConfig,
        skill::Skill,
        skill::DamageType,
        testutil::RecordingEventPublisher,
    };

    fn map() -> Map {
        Map::new(crate::ids::MapId::new(1), "overworld".into(), 1000.0, 1000.0, 100.0, 200.0)
    }

    fn player_at(id: u32, pos: Vec3) -> Actor {
        let entity = Entity::new(EntityId::new(id), EntityType::Player, UnitId::new(1), Transform::at(pos));
        let mut actor = Actor::new(entity, "hero".into(), 1, AttributeSet::level_scaled_defaults(1));
        actor.start();
        actor
    }

    fn monster_at(id: u32, pos: Vec3, attack_skill: SkillId) -> Monster {
        let entity = Entity::new(EntityId::new(id), EntityType::Monster, UnitId::new(1), Transform::at(pos));
        let mut actor = Actor::new(entity, "slime".into(), 1, AttributeSet::level_scaled_defaults(1));
        actor.skills.insert(Skill::new(attack_skill, 0.0, 0.01, 0.01, 10.0, 1.0, 0.0, DamageType::Physical));
        actor.start();
        let config = MonsterAiConfig {
            attack_range: 5.0,
            attack_skill,
            ..MonsterAiConfig::default()
        };
        Monster::new(actor, pos, config)
    }

    #[test]
    fn spawning_publishes_entity_and_player_created() {
        let publisher = Arc::new(RecordingEventPublisher::new());
        let mut world = World::new(map());
        world.set_publisher(publisher.clone());
        world.spawn_player(player_at(1, Vec3::ZERO), Duration::ZERO).unwrap();

        let names = publisher.names();
        assert!(names.contains(&event_names::ENTITY_CREATED));
        assert!(names.contains(&event_names::PLAYER_CREATED));
    }

    #[test]
    fn monster_casts_on_nearby_player_and_delivers_damage() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let publisher = Arc::new(RecordingEventPublisher::new());
        let mut world = World::new(map());
        world.set_publisher(publisher.clone());

        let skill_id = SkillId::new(1);
        world.spawn_player(player_at(1, Vec3::new(2.0, 0.0, 0.0)), Duration::ZERO).unwrap();
        world.spawn_monster(monster_at(2, Vec3::ZERO, skill_id), Duration::ZERO).unwrap();

        // Monster aggros, enters Cast, then the cast windup fires.
        for _ in 0..10 {
            world.tick(0.1, Duration::ZERO);
        }

        let player = world.actor(EntityId::new(1)).unwrap();
        assert!(player.hp() < player.finals().get(crate::attribute::Stat::MaxHP));
        assert!(publisher.names().contains(&event_names::SKILL_CAST));
        assert!(publisher.names().contains(&event_names::DAMAGE_DEALT));
    }

    #[test]
    fn despawn_publishes_entity_destroyed() {
        let publisher = Arc::new(RecordingEventPublisher::new());
        let mut world = World::new(map());
        world.set_publisher(publisher.clone());
        let id = world.spawn_player(player_at(1, Vec3::ZERO), Duration::ZERO).unwrap();
        world.despawn(id, Duration::ZERO).unwrap();
        assert!(publisher.names().contains(&event_names::ENTITY_DESTROYED));
        assert!(world.actor(id).is_none());
    }

    #[test]
    fn missile_hit_delivers_damage_and_despawns() {
        let mut world = World::new(map());
        world.spawn_player(player_at(1, Vec3::new(1.0, 0.0, 0.0)), Duration::ZERO).unwrap();

        let skill_id = SkillId::new(9);
        let caster_entity = Entity::new(EntityId::new(3), EntityType::Player, UnitId::new(1), Transform::at(Vec3::ZERO));
        let mut caster = Actor::new(caster_entity, "archer".into(), 1, AttributeSet::level_scaled_defaults(1));
        caster.skills.insert(Skill::new(skill_id, 0.0, 0.01, 0.01, 15.0, 1.0, 0.0, DamageType::Physical));
        caster.start();
        world.spawn_player(caster, Duration::ZERO).unwrap();

        let missile_entity = Entity::new(EntityId::new(10), EntityType::Missile, UnitId::new(1), Transform::at(Vec3::ZERO));
        let missile = Missile::new(missile_entity, EntityId::new(3), MissileTarget::Entity(EntityId::new(1)), skill_id, 100.0, 5.0);
        world.spawn_missile(missile, Duration::ZERO).unwrap();

        world.tick(0.1, Duration::ZERO);

        assert!(world.missile(EntityId::new(10)).is_none());
        let target = world.actor(EntityId::new(1)).unwrap();
        assert!(target.hp() < target.finals().get(crate::attribute::Stat::MaxHP));
    }

    #[test]
    fn scheduler_callback_drives_world_tick() {
        let world = Arc::new(Mutex::new(World::new(map())));
        world.lock().unwrap().spawn_player(player_at(1, Vec3::ZERO), Duration::ZERO).unwrap();

        let mut scheduler = crate::scheduler::Scheduler::new(crate::config::SchedulerConfig::default());
        let world_for_callback = world.clone();
        scheduler.register_callback(Box::new(move |dt| {
            world_for_callback.lock().expect("poisoned lock").tick(dt, Duration::ZERO);
            Ok(())
        }));

        scheduler.tick();
        scheduler.tick();

        assert!(world.lock().unwrap().actor(EntityId::new(1)).is_some());
    }
}
