//! Buff stacking and decay (spec §3 "Buffs", §4.1 `BuffManager`).

use crate::{
    attribute::AttributeModifier,
    flags::FlagState,
    ids::{BuffId, EntityId},
};

/// A single active buff instance.
///
/// Stacking is by reference: multiple instances of the same [`BuffId`] on
/// the same owner coexist independently. The spec leaves refresh semantics
/// unspecified and explicitly treats same-id buffs as independent (§9,
/// ambiguous behavior 3) — this is the policy this core implements.
#[derive(Debug, Clone)]
pub struct Buff {
    pub id: BuffId,
    pub owner: EntityId,
    pub caster: EntityId,
    pub duration: f32,
    pub elapsed: f32,
    pub modifier: AttributeModifier,
    pub flags: FlagState,
}

impl Buff {
    #[must_use]
    pub fn new(
        id: BuffId,
        owner: EntityId,
        caster: EntityId,
        duration: f32,
        modifier: AttributeModifier,
        flags: FlagState,
    ) -> Self {
        Self {
            id,
            owner,
            caster,
            duration,
            elapsed: 0.0,
            modifier,
            flags,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
    }
}

/// Ordered list of active buffs for one actor, plus the derived final
/// attributes and flag state they produce.
#[derive(Debug, Default)]
pub struct BuffManager {
    buffs: Vec<Buff>,
}

impl BuffManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> &[Buff] {
        &self.buffs
    }

    /// Appends a buff. Callers must recompute attributes and flags
    /// afterwards (see [`crate::actor::Actor::add_buff`], which does both).
    pub fn add_buff(&mut self, buff: Buff) {
        self.buffs.push(buff);
    }

    /// Removes every buff instance with the given id. Returns `true` if any
    /// were removed.
    pub fn remove_buff_by_id(&mut self, id: BuffId) -> bool {
        let before = self.buffs.len();
        self.buffs.retain(|b| b.id != id);
        self.buffs.len() != before
    }

    /// Removes a specific buff instance by owner+id+caster identity. Only
    /// meaningful when more than one instance of the same id is stacked.
    pub fn remove_first_matching(&mut self, id: BuffId, caster: EntityId) -> bool {
        if let Some(pos) = self.buffs.iter().position(|b| b.id == id && b.caster == caster) {
            self.buffs.remove(pos);
            true
        } else {
            false
        }
    }

    /// Advances every buff by `dt`, removes any that expired in this pass,
    /// and returns the ids that expired (spec §3 invariant 7: an expired
    /// buff must be gone before the same tick's attribute recompute).
    pub fn update(&mut self, dt: f32) -> Vec<BuffId> {
        for buff in &mut self.buffs {
            buff.tick(dt);
        }
        let expired: Vec<BuffId> = self
            .buffs
            .iter()
            .filter(|b| b.is_expired())
            .map(|b| b.id)
            .collect();
        self.buffs.retain(|b| !b.is_expired());
        expired
    }

    /// Snapshot of every active buff's attribute modifier, in insertion
    /// order, ready to be folded via [`crate::attribute::fold`].
    #[must_use]
    pub fn collect_modifiers(&self) -> Vec<AttributeModifier> {
        self.buffs.iter().map(|b| b.modifier).collect()
    }

    /// Folds every active buff's flag contribution by OR.
    #[must_use]
    pub fn refresh_flags(&self) -> FlagState {
        self.buffs.iter().fold(FlagState::empty(), |acc, b| acc | b.flags)
    }
}
