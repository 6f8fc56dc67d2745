//! `Npc`: a non-combat entity offering player-facing services (spec §3
//! "NPC").

use enumset::{EnumSet, EnumSetType};

use crate::entity::Entity;

/// A service an NPC can provide. Composable by OR, same pattern as
/// [`crate::flags::Flag`].
#[derive(EnumSetType, Debug)]
pub enum NpcCapability {
    Dialogue,
    Shop,
    Quest,
    Teleport,
    Craft,
}

pub type NpcCapabilities = EnumSet<NpcCapability>;

/// A non-combat entity: shopkeepers, quest givers, trainers (spec §3
/// "NPC").
///
/// Extends [`Entity`] directly rather than [`crate::actor::Actor`] — NPCs
/// have no HP, skills, or buffs (spec §4.2: "NPCs are not actors").
pub struct Npc {
    pub entity: Entity,
    pub display_name: String,
    pub capabilities: NpcCapabilities,
}

impl Npc {
    #[must_use]
    pub fn new(entity: Entity, display_name: String, capabilities: NpcCapabilities) -> Self {
        Self {
            entity,
            display_name,
            capabilities,
        }
    }

    #[must_use]
    pub fn can(&self, capability: NpcCapability) -> bool {
        self.capabilities.contains(capability)
    }
}
