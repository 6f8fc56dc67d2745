//! `Spell`: an actor's current cast target, and the deterministic damage
//! formula (spec §4.1 "Spell", "Damage formula").

use crate::{
    attribute::{AttributeSet, Stat},
    ids::{EntityId, SkillId},
    skill::{DamageType, Skill},
};

/// Result of resolving one skill's effect against one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInfo {
    pub source: EntityId,
    pub skill_id: SkillId,
    pub amount: f32,
    pub damage_type: DamageType,
    /// Always `false` unless a higher layer opts into a crit roll (spec §9,
    /// ambiguous behavior 2: the source never rolls crit; this core exposes
    /// the field but never sets it).
    pub is_crit: bool,
}

/// Decides whether an attack crits, given the attacker's `Cri` stat as a
/// `[0, 1]` chance. The source never rolls crit unless a caller
/// deliberately opts in (spec §9, ambiguous behavior 2: "the
/// reimplementation should expose a hook but default to false unless
/// explicit configuration enables it").
pub trait CritRoller {
    fn roll(&mut self, chance: f32) -> bool;
}

/// The spec-mandated default: crit is never rolled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCrit;

impl CritRoller for NeverCrit {
    fn roll(&mut self, _chance: f32) -> bool {
        false
    }
}

/// A [`CritRoller`] backed by a uniform random draw, for implementations
/// that opt into crit rolls.
#[derive(Debug)]
pub struct RandomCritRoller<R> {
    rng: R,
}

impl<R: rand::Rng> RandomCritRoller<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: rand::Rng> CritRoller for RandomCritRoller<R> {
    fn roll(&mut self, chance: f32) -> bool {
        self.rng.random::<f32>() < chance.clamp(0.0, 1.0)
    }
}

/// Computes `atk`, mitigates by the defender's matching resistance, and
/// floors the result at zero (spec §4.1 "Damage formula"):
///
/// ```text
/// atk       = base + AD * scaleAD + AP * scaleAP
/// def       = Magical ? MDef : Def
/// reduction = def > 0 ? 1 - def / (def + 100) : 1
/// damage    = max(0, atk * reduction)
/// ```
///
/// Crit is resolved through `crit_roller` using the attacker's `Cri`
/// stat as the chance and `Crd` as the damage multiplier applied on a
/// hit; with [`NeverCrit`] this always behaves as the spec's base
/// formula.
#[must_use]
pub fn compute_damage(
    source: EntityId,
    attacker: &AttributeSet,
    skill: &Skill,
    defender: &AttributeSet,
    crit_roller: &mut impl CritRoller,
) -> DamageInfo {
    let atk = skill.base_damage + attacker.get(Stat::AD) * skill.scale_ad + attacker.get(Stat::AP) * skill.scale_ap;

    let def = match skill.damage_type {
        DamageType::Magical => defender.get(Stat::MDef),
        _ => defender.get(Stat::Def),
    };

    let reduction = if def > 0.0 { 1.0 - def / (def + 100.0) } else { 1.0 };

    let is_crit = crit_roller.roll(attacker.get(Stat::Cri));
    let crit_multiplier = if is_crit { attacker.get(Stat::Crd).max(1.0) } else { 1.0 };

    let amount = (atk * reduction * crit_multiplier).max(0.0);

    DamageInfo {
        source,
        skill_id: skill.id,
        amount,
        damage_type: skill.damage_type,
        is_crit,
    }
}

/// Holds the actor's current skill and single target (spec §4.1 "Spell").
#[derive(Debug, Default, Clone, Copy)]
pub struct Spell {
    current_skill: Option<SkillId>,
    current_target: Option<EntityId>,
}

impl Spell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_skill(&self) -> Option<SkillId> {
        self.current_skill
    }

    #[must_use]
    pub const fn current_target(&self) -> Option<EntityId> {
        self.current_target
    }

    /// Records the skill/target pair that started casting. Callers invoke
    /// this only after `Skill::start_cast` succeeds.
    pub fn record_cast(&mut self, skill_id: SkillId, target: EntityId) {
        self.current_skill = Some(skill_id);
        self.current_target = Some(target);
    }

    pub fn clear(&mut self) {
        self.current_skill = None;
        self.current_target = None;
    }
}
