use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Unique identity of a live entity within the process.
///
/// `0` is the sentinel/invalid id; real entities are assigned positive,
/// monotonically increasing values by [`crate::managers::EntityManager`].
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Serialize, Deserialize,
)]
pub struct EntityId(u32);

impl EntityId {
    /// The sentinel id. No live entity is ever assigned this value.
    pub const INVALID: Self = Self(0);

    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Pointer into a static definition table (class/level stats, skill data,
/// unit metadata). The table itself is an external port; this core never
/// interprets the id beyond passing it to [`crate::ports::UnitDefineRepository`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct UnitId(u32);

impl UnitId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identity of a [`crate::skill::Skill`] definition.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct SkillId(u32);

impl SkillId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identity of a [`crate::buff::Buff`] definition.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct BuffId(u32);

impl BuffId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identity of a [`crate::map::Map`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct MapId(u32);

impl MapId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// The kind of a live entity, mirroring the concrete types the registry can
/// hold. Kept as a plain tag (rather than inferred from the stored variant)
/// so ports can filter `GetByType` queries without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Player,
    Monster,
    Npc,
    Missile,
    DroppedItem,
    Pet,
    Summon,
}
