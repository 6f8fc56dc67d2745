//! Skill state machine and damage-type tagging (spec §3 "Skills", §4.1
//! "Skill state machine").

use crate::{flags::FlagState, ids::SkillId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageType {
    Physical,
    Magical,
    Real,
    Heal,
}

/// The five-state machine driving a skill's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillState {
    Ready,
    Intonate,
    Active,
    Cooling,
}

/// Timing and damage parameters plus current FSM state for one actor's
/// skill slot.
#[derive(Debug, Clone)]
pub struct Skill {
    pub id: SkillId,
    pub cast_time: f32,
    pub active_time: f32,
    pub cooldown_time: f32,
    pub base_damage: f32,
    pub scale_ad: f32,
    pub scale_ap: f32,
    pub damage_type: DamageType,
    state: SkillState,
    timer: f32,
}

/// Guards checked against the owning actor before a cast may begin (spec
/// §4.1: "owner alive and not Stunned/Silenced").
#[derive(Debug, Clone, Copy)]
pub struct CastGuards {
    pub owner_alive: bool,
    pub owner_flags: FlagState,
}

impl Skill {
    #[must_use]
    pub fn new(
        id: SkillId,
        cast_time: f32,
        active_time: f32,
        cooldown_time: f32,
        base_damage: f32,
        scale_ad: f32,
        scale_ap: f32,
        damage_type: DamageType,
    ) -> Self {
        Self {
            id,
            cast_time,
            active_time,
            cooldown_time,
            base_damage,
            scale_ad,
            scale_ap,
            damage_type,
            state: SkillState::Ready,
            timer: 0.0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SkillState {
        self.state
    }

    /// `SetTimings` from the spec's FSM scenario (§8, concrete scenario 4).
    pub fn set_timings(&mut self, cast_time: f32, active_time: f32, cooldown_time: f32) {
        self.cast_time = cast_time;
        self.active_time = active_time;
        self.cooldown_time = cooldown_time;
    }

    /// Attempts to begin a cast. Returns `true` on success.
    ///
    /// Fails (without mutating state) when the skill is not `Ready`, the
    /// owner is dead, or the owner carries Stun or Silence (spec §4.1).
    #[must_use]
    pub fn start_cast(&mut self, guards: CastGuards) -> bool {
        if self.state != SkillState::Ready {
            return false;
        }
        if !guards.owner_alive {
            return false;
        }
        if guards.owner_flags.contains(crate::flags::Flag::Stun)
            || guards.owner_flags.contains(crate::flags::Flag::Silence)
        {
            return false;
        }

        if self.cast_time > 0.0 {
            self.state = SkillState::Intonate;
            self.timer = self.cast_time;
        } else {
            self.state = SkillState::Active;
            self.timer = self.active_time;
        }
        true
    }

    /// Advances the current state's timer by `dt` and performs any
    /// resulting transition. Returns `true` exactly when this call caused
    /// the skill to enter `Active` (i.e. the moment its effect should
    /// apply).
    pub fn update(&mut self, dt: f32) -> bool {
        match self.state {
            SkillState::Ready => false,
            SkillState::Intonate => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = SkillState::Active;
                    self.timer = self.active_time;
                    true
                } else {
                    false
                }
            }
            SkillState::Active => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = SkillState::Cooling;
                    self.timer = self.cooldown_time;
                }
                false
            }
            SkillState::Cooling => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.state = SkillState::Ready;
                    self.timer = 0.0;
                }
                false
            }
        }
    }

    #[must_use]
    pub const fn is_cooling(&self) -> bool {
        matches!(self.state, SkillState::Cooling)
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, SkillState::Ready)
    }
}

/// Per-actor registry of skills by id.
#[derive(Debug, Default)]
pub struct SkillManager {
    skills: rustc_hash::FxHashMap<SkillId, Skill>,
}

impl SkillManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: Skill) {
        self.skills.insert(skill.id, skill);
    }

    #[must_use]
    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    pub fn get_mut(&mut self, id: SkillId) -> Option<&mut Skill> {
        self.skills.get_mut(&id)
    }

    /// Advances every skill's timer. Returns the ids that entered `Active`
    /// this tick, in insertion-stable order, so callers can apply effects.
    pub fn update(&mut self, dt: f32) -> Vec<SkillId> {
        self.skills
            .iter_mut()
            .filter(|(_, skill)| skill.update(dt))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guards(alive: bool, flags: FlagState) -> CastGuards {
        CastGuards {
            owner_alive: alive,
            owner_flags: flags,
        }
    }

    #[test]
    fn instant_cast_skips_intonate() {
        let mut skill = Skill::new(
            SkillId::new(1),
            0.0,
            0.01,
            0.01,
            20.0,
            1.0,
            0.0,
            DamageType::Physical,
        );
        assert!(skill.start_cast(guards(true, FlagState::empty())));
        assert_eq!(skill.state(), SkillState::Active);
    }

    #[test]
    fn channeled_cast_goes_ready_active_cooling_ready() {
        // spec §8 scenario 4, SetTimings(0.05, 0.05, 0.05), dt=0.03 and dt=0.06
        let mut skill = Skill::new(
            SkillId::new(1),
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            DamageType::Physical,
        );
        skill.set_timings(0.05, 0.05, 0.05);
        assert_eq!(skill.state(), SkillState::Ready);

        assert!(skill.start_cast(guards(true, FlagState::empty())));
        assert_eq!(skill.state(), SkillState::Intonate);

        skill.update(0.03);
        assert_eq!(skill.state(), SkillState::Intonate);

        let became_active = skill.update(0.03);
        assert!(became_active);
        assert_eq!(skill.state(), SkillState::Active);

        skill.update(0.06);
        assert_eq!(skill.state(), SkillState::Cooling);

        skill.update(0.06);
        assert_eq!(skill.state(), SkillState::Ready);
    }

    #[test]
    fn cast_rejected_while_stunned() {
        let mut skill = Skill::new(
            SkillId::new(1),
            0.1,
            0.1,
            0.1,
            0.0,
            0.0,
            0.0,
            DamageType::Physical,
        );
        let stunned = crate::flags::Flag::Stun | crate::flags::Flag::Stun;
        assert!(!skill.start_cast(guards(true, stunned)));
        assert_eq!(skill.state(), SkillState::Ready);
    }

    #[test]
    fn cast_rejected_while_cooling_or_dead() {
        let mut skill = Skill::new(
            SkillId::new(1),
            0.0,
            0.01,
            5.0,
            0.0,
            0.0,
            0.0,
            DamageType::Physical,
        );
        assert!(skill.start_cast(guards(true, FlagState::empty())));
        skill.update(0.02); // -> Cooling
        assert!(skill.is_cooling());
        assert!(!skill.start_cast(guards(true, FlagState::empty())));
        assert!(!skill.start_cast(guards(false, FlagState::empty())));
    }

    #[test]
    fn cooling_skill_never_fires_effects() {
        let mut skill = Skill::new(
            SkillId::new(1),
            0.05,
            0.01,
            5.0,
            0.0,
            0.0,
            0.0,
            DamageType::Physical,
        );
        skill.start_cast(guards(true, FlagState::empty())); // -> Intonate
        assert!(skill.update(0.05)); // Intonate -> Active, fires once
        assert!(!skill.update(0.02)); // Active -> Cooling, no fire
        assert!(skill.is_cooling());
        assert!(!skill.update(1.0)); // Cooling -> Ready, never fires
    }
}
