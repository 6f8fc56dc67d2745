//! `Actor`: a combat-capable entity (spec §3 "Actor", §4.1 subsystem
//! ordering).

use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    attribute::{AttributeManager, AttributeSet, Stat},
    buff::{Buff, BuffManager},
    entity::Entity,
    error::{CoreError, CoreResult},
    events::{event_names, DomainEvent, EventPublisher, NullPublisher},
    flags::{Flag, FlagState},
    ids::{BuffId, EntityId, SkillId},
    skill::{CastGuards, Skill, SkillManager},
    spell::{compute_damage, CritRoller, DamageInfo, Spell},
};

/// A combat-capable entity: a player, monster, pet, or summon (spec §3
/// "Actor").
///
/// `hp`/`mp`/`speed` start at zero and are only meaningful after
/// [`Actor::start`] seeds them from the final-attribute snapshot (spec
/// §4.1, tested in §8 "After `Actor.Start`, `HP == finals.MaxHP`").
pub struct Actor {
    pub entity: Entity,
    pub name: String,
    pub level: u32,
    hp: f32,
    mp: f32,
    speed: f32,
    flags: FlagState,
    last_damage: Option<DamageInfo>,
    pub attributes: AttributeManager,
    pub skills: SkillManager,
    pub buffs: BuffManager,
    pub spell: Spell,
    publisher: Arc<dyn EventPublisher>,
}

impl Actor {
    #[must_use]
    pub fn new(entity: Entity, name: String, level: u32, base: AttributeSet) -> Self {
        Self {
            entity,
            name,
            level,
            hp: 0.0,
            mp: 0.0,
            speed: 0.0,
            flags: FlagState::empty(),
            last_damage: None,
            attributes: AttributeManager::new(base),
            skills: SkillManager::new(),
            buffs: BuffManager::new(),
            spell: Spell::new(),
            publisher: Arc::new(NullPublisher),
        }
    }

    pub fn set_publisher(&mut self, publisher: Arc<dyn EventPublisher>) {
        self.publisher = publisher;
    }

    #[must_use]
    pub fn finals(&self) -> &AttributeSet {
        self.attributes.finals()
    }

    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    #[must_use]
    pub const fn mp(&self) -> f32 {
        self.mp
    }

    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    #[must_use]
    pub const fn flags(&self) -> FlagState {
        self.flags
    }

    #[must_use]
    pub const fn last_damage(&self) -> Option<DamageInfo> {
        self.last_damage
    }

    /// Seeds HP/MP/speed from the current final-attribute snapshot. Must be
    /// called once after construction, before the actor enters a map.
    pub fn start(&mut self) {
        self.attributes.recalculate(&[]);
        let finals = *self.attributes.finals();
        self.hp = finals.get(Stat::MaxHP);
        self.mp = finals.get(Stat::MaxMP);
        self.speed = finals.get(Stat::Speed);
    }

    #[must_use]
    pub const fn is_death(&self) -> bool {
        self.hp <= 0.0
    }

    /// Clamps `hp` into `[0, finals.MaxHP]` after applying `delta` (spec §3
    /// invariant 5).
    pub fn change_hp(&mut self, delta: f32) {
        let max_hp = self.attributes.finals().get(Stat::MaxHP);
        self.hp = (self.hp + delta).clamp(0.0, max_hp);
    }

    /// Clamps `mp` into `[0, finals.MaxMP]` after applying `delta`.
    pub fn change_mp(&mut self, delta: f32) {
        let max_mp = self.attributes.finals().get(Stat::MaxMP);
        self.mp = (self.mp + delta).clamp(0.0, max_mp);
    }

    /// Applies incoming damage: records it, reduces HP, and publishes
    /// `DamageDealt` (spec §4.1 "Damage is applied by `Actor.OnHurt`").
    pub fn on_hurt(&mut self, info: DamageInfo, now: Duration) {
        self.last_damage = Some(info);
        self.change_hp(-info.amount);
        debug!(
            target_id = %self.entity.id,
            source_id = %info.source,
            amount = info.amount,
            is_crit = info.is_crit,
            "damage dealt"
        );
        self.publisher.publish(DomainEvent::new(
            event_names::DAMAGE_DEALT,
            now,
            self.entity.id,
            DamageDealtPayload {
                source: info.source,
                target: self.entity.id,
                amount: info.amount,
                is_crit: info.is_crit,
            },
        ));
    }

    /// Adds a buff and immediately recomputes finals + flags (spec §4.1
    /// `BuffManager::AddBuff`).
    pub fn add_buff(&mut self, buff: Buff, now: Duration) {
        let id = buff.id;
        self.buffs.add_buff(buff);
        self.recompute_from_buffs();
        self.publisher.publish(DomainEvent::new(
            event_names::BUFF_ADDED,
            now,
            self.entity.id,
            BuffChangedPayload { buff_id: id },
        ));
    }

    pub fn remove_buff(&mut self, id: BuffId, now: Duration) -> bool {
        let removed = self.buffs.remove_buff_by_id(id);
        if removed {
            self.recompute_from_buffs();
            self.publisher.publish(DomainEvent::new(
                event_names::BUFF_REMOVED,
                now,
                self.entity.id,
                BuffChangedPayload { buff_id: id },
            ));
        }
        removed
    }

    /// Per-tick subsystem update, in the normative order from spec §5:
    /// "Entity base -> Skill -> Buff -> HP/MP regen -> speed refresh".
    /// Buff expiry must be visible to this same tick's regen step, which is
    /// why buffs advance before regen reads `finals`.
    pub fn update(&mut self, dt: f32, now: Duration) -> Vec<SkillId> {
        let activated = self.skills.update(dt);

        let expired = self.buffs.update(dt);
        if !expired.is_empty() {
            self.recompute_from_buffs();
            for id in &expired {
                self.publisher.publish(DomainEvent::new(
                    event_names::BUFF_REMOVED,
                    now,
                    self.entity.id,
                    BuffChangedPayload { buff_id: *id },
                ));
            }
        }

        let finals = *self.attributes.finals();
        if self.hp > 0.0 {
            self.change_hp(finals.get(Stat::HPRegen) * dt);
            self.change_mp(finals.get(Stat::MPRegen) * dt);
        }
        self.speed = finals.get(Stat::Speed);

        activated
    }

    fn recompute_from_buffs(&mut self) {
        let modifiers = self.buffs.collect_modifiers();
        self.attributes.recalculate(&modifiers);
        self.flags = self.buffs.refresh_flags();
    }

    /// Attempts to start casting `skill_id` at `target` (spec §4.1
    /// "`Spell.Cast`"). Publishes `SkillCast` on success.
    pub fn cast(&mut self, skill_id: SkillId, target: EntityId, now: Duration) -> CoreResult<()> {
        let alive = !self.is_death();
        let flags = self.flags;
        let skill = self
            .skills
            .get_mut(skill_id)
            .ok_or(CoreError::UnknownSkill { id: skill_id })?;

        let guards = CastGuards {
            owner_alive: alive,
            owner_flags: flags,
        };

        if !skill.start_cast(guards) {
            return Err(CoreError::SkillRejected {
                reason: "skill not ready, owner dead, or owner stunned/silenced",
            });
        }

        self.spell.record_cast(skill_id, target);
        self.publisher.publish(DomainEvent::new(
            event_names::SKILL_CAST,
            now,
            self.entity.id,
            SkillCastPayload { skill_id, target },
        ));
        Ok(())
    }

    /// Raises `level` and re-seeds base stats from `new_base`, publishing
    /// `PlayerLevelUp` when the level actually increases. A no-op event-wise
    /// when called with a level that does not exceed the current one.
    pub fn set_level(&mut self, level: u32, new_base: AttributeSet, now: Duration) {
        let leveled_up = level > self.level;
        self.level = level;
        let modifiers = self.buffs.collect_modifiers();
        self.attributes.set_base(new_base, &modifiers);
        if leveled_up {
            self.publisher.publish(DomainEvent::new(
                event_names::PLAYER_LEVEL_UP,
                now,
                self.entity.id,
                PlayerLevelUpPayload { level },
            ));
        }
    }

    /// Computes the current spell's damage against `defender_finals`. The
    /// caller (the map/scheduler, which alone can see both actors) is
    /// responsible for delivering it via `defender.on_hurt`.
    #[must_use]
    pub fn resolve_skill_effect(
        &self,
        skill_id: SkillId,
        defender_finals: &AttributeSet,
        crit_roller: &mut impl CritRoller,
    ) -> Option<DamageInfo> {
        let skill = self.skills.get(skill_id)?;
        Some(compute_damage(self.entity.id, self.finals(), skill, defender_finals, crit_roller))
    }

    #[must_use]
    pub const fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(flag)
    }
}

#[derive(Debug, serde::Serialize)]
struct DamageDealtPayload {
    source: EntityId,
    target: EntityId,
    amount: f32,
    is_crit: bool,
}

#[derive(Debug, serde::Serialize)]
struct BuffChangedPayload {
    buff_id: BuffId,
}

#[derive(Debug, serde::Serialize)]
struct SkillCastPayload {
    skill_id: SkillId,
    target: EntityId,
}

#[derive(Debug, serde::Serialize)]
struct PlayerLevelUpPayload {
    level: u32,
}
