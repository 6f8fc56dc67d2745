//! `Monster`: an AI-driven actor tied to a spawn point (spec §3 "Monster",
//! §4.2 "Monster AI").

use geometry::distance2d;
use glam::Vec3;

use crate::{
    actor::Actor,
    ids::{EntityId, SkillId},
};

/// The seven-state AI loop (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Walk,
    Chase,
    Cast,
    Goback,
    Hurt,
    Death,
}

/// Tunable distances and timings driving the AI transitions (spec §4.2,
/// "implementation-defined constants").
#[derive(Debug, Clone, Copy)]
pub struct MonsterAiConfig {
    pub aggro_range: f32,
    pub leash_range: f32,
    pub attack_range: f32,
    pub idle_roam_interval: f32,
    /// Distance from `spawn_point` a `Walk` patrol is allowed to wander
    /// before turning back (spec §3 "spawn-point reference (patrol/chase/
    /// attack radii)").
    pub patrol_radius: f32,
    /// Time spent in `Walk` before giving up and returning to `Idle` (spec
    /// §4.2 "after 5s go Idle").
    pub walk_timeout: f32,
    /// Time spent in `Cast` before attempting a skill cast and returning to
    /// `Chase` (spec §4.2 "after 0.5s attempt skill cast then return to
    /// Chase").
    pub cast_windup: f32,
    /// Time spent in `Hurt` before flinching back to `Chase` (spec §4.2
    /// "after 0.5s flinch -> Chase").
    pub hurt_flinch: f32,
    /// The skill a completed `Cast` windup attempts against its target.
    pub attack_skill: SkillId,
}

impl Default for MonsterAiConfig {
    fn default() -> Self {
        Self {
            aggro_range: 8.0,
            leash_range: 20.0,
            attack_range: 2.0,
            idle_roam_interval: 3.0,
            patrol_radius: 6.0,
            walk_timeout: 5.0,
            cast_windup: 0.5,
            hurt_flinch: 0.5,
            attack_skill: SkillId::new(1),
        }
    }
}

/// A monster: an [`Actor`] anchored to a spawn point, driven by a small AI
/// loop rather than player input (spec §3 "Monster").
///
/// Composition, not inheritance (spec §9): `Monster` owns an `Actor` value
/// rather than subclassing it, so the combat subsystems stay reusable by
/// [`crate::npc`]-adjacent future actor kinds without a class hierarchy.
pub struct Monster {
    pub actor: Actor,
    pub spawn_point: Vec3,
    pub config: MonsterAiConfig,
    state: AiState,
    target: Option<EntityId>,
    idle_timer: f32,
    walk_timer: f32,
    state_timer: f32,
    /// The cast this tick's `Cast -> Chase` transition should attempt, set
    /// the instant the monster enters `Cast` and taken by the caller via
    /// [`Monster::take_pending_cast`].
    pending_cast: Option<EntityId>,
}

impl Monster {
    #[must_use]
    pub fn new(actor: Actor, spawn_point: Vec3, config: MonsterAiConfig) -> Self {
        Self {
            actor,
            spawn_point,
            config,
            state: AiState::Idle,
            target: None,
            idle_timer: 0.0,
            walk_timer: 0.0,
            state_timer: 0.0,
            pending_cast: None,
        }
    }

    /// Takes the target a completed `Cast` windup should attack, if one is
    /// ready this tick. The caller (the map/scheduler) is responsible for
    /// actually invoking [`Actor::cast`] — this FSM only decides when.
    pub fn take_pending_cast(&mut self) -> Option<EntityId> {
        self.pending_cast.take()
    }

    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Forces `Death` regardless of current state. Entered once `Actor.HP`
    /// reaches zero; only a respawn through
    /// [`crate::managers::spawn_manager::SpawnManager`] clears it.
    pub fn enter_death(&mut self) {
        self.state = AiState::Death;
        self.target = None;
    }

    /// Advances the AI one tick. `nearest_hostile` is supplied by the map
    /// layer (the monster itself never scans the world); pass `None` when
    /// no hostile is within [`MonsterAiConfig::aggro_range`].
    ///
    /// Transition table (spec §4.2):
    /// - `Idle` -> `Chase` when a hostile enters aggro range; -> `Walk`
    ///   after `idle_roam_interval` with no hostile nearby.
    /// - `Walk` -> `Chase` on aggro; -> `Idle` once it wanders past
    ///   `patrol_radius` or `walk_timeout` elapses.
    /// - `Chase` -> `Cast` when within attack range; -> `Idle` if the
    ///   target dies or goes out of view; -> `Goback` if it leashes out of
    ///   range while still tracked.
    /// - `Cast` -> `Chase` once the skill finishes, if the target is still
    ///   in range; -> `Idle`/`Goback` otherwise, by the same rule as `Chase`.
    /// - `Goback` -> `Idle` within 1.0 units of the spawn point, restoring
    ///   full HP/MP (spec §4.2 "trigger Revive").
    /// - Any state -> `Hurt` is never entered automatically; callers report
    ///   it via [`Monster::on_hurt`] and this FSM returns to `Chase` once
    ///   the hit-reaction window elapses, modeled here as a single-tick
    ///   pass-through since the spec leaves its duration unspecified (§9,
    ///   ambiguous behavior 4).
    pub fn update_ai(&mut self, dt: f32, own_position: Vec3, nearest_hostile: Option<(EntityId, Vec3)>) {
        if self.actor.is_death() {
            self.state = AiState::Death;
            return;
        }

        match self.state {
            AiState::Death => {}
            AiState::Idle => {
                self.idle_timer += dt;
                if let Some((id, pos)) = nearest_hostile {
                    if distance2d(own_position, pos) <= self.config.aggro_range {
                        self.target = Some(id);
                        self.state = AiState::Chase;
                    }
                } else if self.idle_timer >= self.config.idle_roam_interval {
                    self.idle_timer = 0.0;
                    self.walk_timer = 0.0;
                    self.state = AiState::Walk;
                }
            }
            AiState::Walk => {
                if let Some((id, pos)) = nearest_hostile {
                    if distance2d(own_position, pos) <= self.config.aggro_range {
                        self.target = Some(id);
                        self.state = AiState::Chase;
                        return;
                    }
                }
                self.walk_timer += dt;
                let wandered_too_far = distance2d(own_position, self.spawn_point) > self.config.patrol_radius;
                if wandered_too_far || self.walk_timer >= self.config.walk_timeout {
                    self.walk_timer = 0.0;
                    self.state = AiState::Idle;
                }
            }
            AiState::Chase => self.update_chase(own_position, nearest_hostile),
            AiState::Cast => {
                self.state_timer += dt;
                if self.state_timer >= self.config.cast_windup {
                    self.state_timer = 0.0;
                    self.pending_cast = self.target;
                    self.update_chase(own_position, nearest_hostile);
                }
            }
            AiState::Hurt => {
                self.state_timer += dt;
                if self.state_timer >= self.config.hurt_flinch {
                    self.state_timer = 0.0;
                    self.update_chase(own_position, nearest_hostile);
                }
            }
            AiState::Goback => {
                if distance2d(own_position, self.spawn_point) <= 1.0 {
                    self.actor.start();
                    self.state = AiState::Idle;
                    self.target = None;
                }
            }
        }
    }

    fn update_chase(&mut self, own_position: Vec3, nearest_hostile: Option<(EntityId, Vec3)>) {
        let Some((id, pos)) = nearest_hostile.filter(|(id, _)| self.target == Some(*id)) else {
            self.state = AiState::Idle;
            self.target = None;
            return;
        };

        if distance2d(own_position, self.spawn_point) > self.config.leash_range {
            self.state = AiState::Goback;
            self.target = None;
            return;
        }

        let was_casting = self.state == AiState::Cast;
        let entering_cast = distance2d(own_position, pos) <= self.config.attack_range;
        self.state = if entering_cast { AiState::Cast } else { AiState::Chase };
        if entering_cast && !was_casting {
            self.state_timer = 0.0;
        }
    }

    /// Reports that the monster took damage, entering a brief `Hurt` react
    /// (spec §4.2: "incoming damage interrupts Idle/Walk and forces a
    /// reaction before returning to the combat loop").
    pub fn on_hurt(&mut self, attacker: EntityId) {
        if self.actor.is_death() {
            return;
        }
        self.target.get_or_insert(attacker);
        if matches!(self.state, AiState::Idle | AiState::Walk | AiState::Goback) {
            self.state = AiState::Hurt;
            self.state_timer = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        attribute::{AttributeSet, Stat},
        entity::Entity,
        ids::{EntityId, EntityType, UnitId},
    };

    use super::*;
    use geometry::Transform;

    fn monster_at(pos: Vec3) -> Monster {
        let entity = Entity::new(EntityId::new(1), EntityType::Monster, UnitId::new(1), Transform::at(pos));
        let mut actor = Actor::new(entity, "slime".into(), 1, AttributeSet::level_scaled_defaults(1));
        actor.start();
        Monster::new(actor, pos, MonsterAiConfig::default())
    }

    #[test]
    fn idle_chases_hostile_within_aggro_range() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Chase);
        assert_eq!(m.target(), Some(EntityId::new(2)));
    }

    #[test]
    fn chase_enters_cast_within_attack_range() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Cast);
    }

    #[test]
    fn losing_target_triggers_idle() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        m.update_ai(0.1, Vec3::ZERO, None);
        assert_eq!(m.state(), AiState::Idle);
        assert!(m.target().is_none());
    }

    #[test]
    fn leashing_out_of_range_triggers_goback() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        let far = Vec3::new(25.0, 0.0, 0.0);
        m.update_ai(0.1, far, Some((EntityId::new(2), Vec3::new(26.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Goback);
        assert!(m.target().is_none());
    }

    #[test]
    fn goback_restores_hp_and_returns_to_idle_at_spawn() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        let far = Vec3::new(25.0, 0.0, 0.0);
        m.update_ai(0.1, far, Some((EntityId::new(2), Vec3::new(26.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Goback);

        m.actor.change_hp(-50.0);
        assert!(m.actor.hp() < m.actor.finals().get(Stat::MaxHP));
        assert!(m.actor.hp() > 0.0);

        m.update_ai(0.1, Vec3::new(0.5, 0.0, 0.0), None);
        assert_eq!(m.state(), AiState::Idle);
        assert_eq!(m.actor.hp(), m.actor.finals().get(Stat::MaxHP));
    }

    #[test]
    fn walk_returns_to_idle_after_wandering_past_patrol_radius() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(m.config.idle_roam_interval, Vec3::ZERO, None);
        assert_eq!(m.state(), AiState::Walk);
        m.update_ai(0.1, Vec3::new(100.0, 0.0, 0.0), None);
        assert_eq!(m.state(), AiState::Idle);
    }

    #[test]
    fn walk_returns_to_idle_after_timeout() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(m.config.idle_roam_interval, Vec3::ZERO, None);
        assert_eq!(m.state(), AiState::Walk);
        m.update_ai(m.config.walk_timeout, Vec3::ZERO, None);
        assert_eq!(m.state(), AiState::Idle);
    }

    #[test]
    fn cast_windup_yields_pending_cast_then_returns_to_chase() {
        let mut m = monster_at(Vec3::ZERO);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(3.0, 0.0, 0.0))));
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Cast);
        assert!(m.take_pending_cast().is_none());

        m.update_ai(0.5, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(m.take_pending_cast(), Some(EntityId::new(2)));
        assert_eq!(m.state(), AiState::Cast);
    }

    #[test]
    fn hurt_flinches_back_to_chase_after_window() {
        let mut m = monster_at(Vec3::ZERO);
        m.on_hurt(EntityId::new(2));
        assert_eq!(m.state(), AiState::Hurt);
        m.update_ai(0.5, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Cast);
    }

    #[test]
    fn death_is_sticky() {
        let mut m = monster_at(Vec3::ZERO);
        m.actor.change_hp(-1_000_000.0);
        m.update_ai(0.1, Vec3::ZERO, Some((EntityId::new(2), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(m.state(), AiState::Death);
    }
}
