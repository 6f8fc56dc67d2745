//! Final-stat folding for actors (spec §3 "Attribute set", §4.1 `AttributeManager`).

use serde::{Deserialize, Serialize};

macro_rules! stats {
    ($($name:ident => $idx:expr),+ $(,)?) => {
        /// Index into an [`AttributeSet`]/[`AttributeModifier`]'s backing array.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(usize)]
        pub enum Stat {
            $($name = $idx,)+
        }

        impl Stat {
            pub const COUNT: usize = 0 $(+ { let _ = $idx; 1 })+;
            pub const ALL: [Self; Self::COUNT] = [$(Self::$name,)+];
        }

        /// The canonical final-stat vector (spec §3). All values are `f32`.
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        pub struct AttributeSet {
            values: [f32; Stat::COUNT],
        }

        impl AttributeSet {
            $(
                #[must_use]
                pub fn $name(&self) -> f32 {
                    self.values[Stat::$name as usize]
                }
            )+
        }
    };
}

stats! {
    MaxHP => 0,
    MaxMP => 1,
    HPRegen => 2,
    MPRegen => 3,
    AD => 4,
    AP => 5,
    Def => 6,
    MDef => 7,
    Cri => 8,
    Crd => 9,
    HitRate => 10,
    DodgeRate => 11,
    Speed => 12,
    AttackSpeed => 13,
}

/// Stats that only ever apply additively, even though an
/// [`AttributeModifier`] technically carries a multiplicative slot for
/// every stat (spec §3: "Regen and rate stats use the additive path only").
const ADDITIVE_ONLY: [Stat; 6] = [
    Stat::HPRegen,
    Stat::MPRegen,
    Stat::Cri,
    Stat::Crd,
    Stat::HitRate,
    Stat::DodgeRate,
];

impl Default for AttributeSet {
    fn default() -> Self {
        Self {
            values: [0.0; Stat::COUNT],
        }
    }
}

impl AttributeSet {
    #[must_use]
    pub fn get(&self, stat: Stat) -> f32 {
        self.values[stat as usize]
    }

    pub fn set(&mut self, stat: Stat, value: f32) {
        self.values[stat as usize] = value;
    }

    /// Level-scaled defaults used when no unit-define config is available
    /// (spec §4.1: "`Start()` seeds base from config (or level-scaled
    /// defaults if no config)"). Scaling is linear and intentionally simple;
    /// real balancing data belongs in [`crate::ports::UnitDefineRepository`].
    #[must_use]
    pub fn level_scaled_defaults(level: u32) -> Self {
        let level = f32::from(u16::try_from(level.max(1)).unwrap_or(u16::MAX));
        let mut set = Self::default();
        set.set(Stat::MaxHP, 100.0 + 10.0 * level);
        set.set(Stat::MaxMP, 50.0 + 5.0 * level);
        set.set(Stat::HPRegen, 1.0);
        set.set(Stat::MPRegen, 1.0);
        set.set(Stat::AD, 10.0 + 2.0 * level);
        set.set(Stat::AP, 0.0);
        set.set(Stat::Def, 1.0 + level);
        set.set(Stat::MDef, 1.0 + level);
        set.set(Stat::Cri, 0.0);
        set.set(Stat::Crd, 1.5);
        set.set(Stat::HitRate, 1.0);
        set.set(Stat::DodgeRate, 0.0);
        set.set(Stat::Speed, 5.0);
        set.set(Stat::AttackSpeed, 1.0);
        set
    }
}

/// An additive delta and a multiplicative delta per stat, contributed by a
/// single [`crate::buff::Buff`] (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifier {
    adds: [f32; Stat::COUNT],
    muls: [f32; Stat::COUNT],
}

impl Default for AttributeModifier {
    fn default() -> Self {
        Self {
            adds: [0.0; Stat::COUNT],
            muls: [0.0; Stat::COUNT],
        }
    }
}

impl AttributeModifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_add(mut self, stat: Stat, amount: f32) -> Self {
        self.adds[stat as usize] += amount;
        self
    }

    #[must_use]
    pub fn with_mul(mut self, stat: Stat, amount: f32) -> Self {
        self.muls[stat as usize] += amount;
        self
    }

    #[must_use]
    pub fn add(&self, stat: Stat) -> f32 {
        self.adds[stat as usize]
    }

    #[must_use]
    pub fn mul(&self, stat: Stat) -> f32 {
        self.muls[stat as usize]
    }
}

/// Applies the deterministic fold rule (spec §3):
///
/// `final[s] = (base[s] + sum(adds[s])) * (1 + sum(muls[s]))`
///
/// with regen/rate stats restricted to the additive path.
#[must_use]
pub fn fold(base: &AttributeSet, modifiers: &[AttributeModifier]) -> AttributeSet {
    let mut out = *base;
    for stat in Stat::ALL {
        let add_total: f32 = modifiers.iter().map(|m| m.add(stat)).sum();
        if ADDITIVE_ONLY.contains(&stat) {
            out.set(stat, base.get(stat) + add_total);
            continue;
        }
        let mul_total: f32 = modifiers.iter().map(|m| m.mul(stat)).sum();
        out.set(stat, (base.get(stat) + add_total) * (1.0 + mul_total));
    }
    out
}

/// Owns an actor's base/final attribute snapshots (spec §4.1).
///
/// `final` is cached and only recomputed when [`AttributeManager::recalculate`]
/// is called explicitly; callers (buff add/remove/expiry) are responsible
/// for invoking it, matching the spec's "recomputed whenever the buff set
/// changes" rule.
#[derive(Debug, Clone)]
pub struct AttributeManager {
    base: AttributeSet,
    last_modifiers: Vec<AttributeModifier>,
    finals: AttributeSet,
}

impl AttributeManager {
    #[must_use]
    pub fn new(base: AttributeSet) -> Self {
        Self {
            base,
            last_modifiers: Vec::new(),
            finals: base,
        }
    }

    #[must_use]
    pub fn base(&self) -> &AttributeSet {
        &self.base
    }

    #[must_use]
    pub fn finals(&self) -> &AttributeSet {
        &self.finals
    }

    /// Replaces base stats wholesale and recomputes finals immediately.
    pub fn set_base(&mut self, base: AttributeSet, modifiers: &[AttributeModifier]) {
        self.base = base;
        self.recalculate(modifiers);
    }

    /// Applies a user-supplied increment to the base stats and recomputes.
    pub fn modify_base(&mut self, modifiers: &[AttributeModifier], f: impl FnOnce(&mut AttributeSet)) {
        f(&mut self.base);
        self.recalculate(modifiers);
    }

    /// Clones base to final, then folds in every active modifier.
    pub fn recalculate(&mut self, modifiers: &[AttributeModifier]) {
        self.last_modifiers = modifiers.to_vec();
        self.finals = fold(&self.base, modifiers);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fold_rule_matches_spec_example() {
        // Actor with base MaxHP=110. Buff: MaxHPAdd=50, MaxHPMul=0.1, SpeedMul=0.2.
        let mut base = AttributeSet::default();
        base.set(Stat::MaxHP, 110.0);
        base.set(Stat::Speed, 5.0);

        let buff = AttributeModifier::new()
            .with_add(Stat::MaxHP, 50.0)
            .with_mul(Stat::MaxHP, 0.1)
            .with_mul(Stat::Speed, 0.2);

        let finals = fold(&base, &[buff]);
        assert_relative_eq!(finals.get(Stat::MaxHP), 176.0);
        assert_relative_eq!(finals.get(Stat::Speed), 6.0);
    }

    #[test]
    fn no_modifiers_means_finals_equal_base() {
        let base = AttributeSet::level_scaled_defaults(5);
        let finals = fold(&base, &[]);
        assert_eq!(finals.get(Stat::MaxHP), base.get(Stat::MaxHP));
        assert_eq!(finals.get(Stat::Speed), base.get(Stat::Speed));
    }

    #[test]
    fn recalculate_is_idempotent() {
        let base = AttributeSet::level_scaled_defaults(3);
        let buff = AttributeModifier::new().with_add(Stat::AD, 5.0);
        let mut mgr = AttributeManager::new(base);
        mgr.recalculate(&[buff]);
        let first = *mgr.finals();
        mgr.recalculate(&[buff]);
        let second = *mgr.finals();
        assert_eq!(first.get(Stat::AD), second.get(Stat::AD));
    }

    #[test]
    fn additive_only_stats_ignore_multiplier() {
        let mut base = AttributeSet::default();
        base.set(Stat::HPRegen, 2.0);
        let modifier = AttributeModifier::new()
            .with_add(Stat::HPRegen, 1.0)
            .with_mul(Stat::HPRegen, 5.0);
        let finals = fold(&base, &[modifier]);
        assert_relative_eq!(finals.get(Stat::HPRegen), 3.0);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// `fold` is a pure function of its inputs: calling it twice with
        /// the same base and modifiers yields bit-identical output (spec
        /// §8 "fold-rule idempotence").
        #[test]
        fn fold_is_idempotent_given_same_inputs(
            max_hp in 0.0f32..10_000.0,
            speed in 0.0f32..100.0,
            add in -1000.0f32..1000.0,
            mul in -1.0f32..5.0,
        ) {
            let mut base = AttributeSet::default();
            base.set(Stat::MaxHP, max_hp);
            base.set(Stat::Speed, speed);
            let modifier = AttributeModifier::new().with_add(Stat::MaxHP, add).with_mul(Stat::Speed, mul);

            let first = fold(&base, &[modifier]);
            let second = fold(&base, &[modifier]);
            prop_assert_eq!(first, second);
        }

        /// Folding with no modifiers is the identity on every stat.
        #[test]
        fn empty_modifiers_is_identity(max_hp in 0.0f32..10_000.0, speed in 0.0f32..100.0) {
            let mut base = AttributeSet::default();
            base.set(Stat::MaxHP, max_hp);
            base.set(Stat::Speed, speed);
            let finals = fold(&base, &[]);
            prop_assert_eq!(finals, base);
        }
    }
}
