use enumset::{EnumSet, EnumSetType};

/// Binary status effects on an actor, composed by OR.
///
/// Stored as an [`EnumSet`] rather than a raw integer bitmask so call sites
/// read as `flags.contains(Flag::Stun)` instead of manual shifting, while
/// still being exactly the bitmask the spec describes under the hood.
#[derive(EnumSetType, Debug)]
pub enum Flag {
    Stun,
    Root,
    Silence,
    Invincible,
    Invisible,
    Disarm,
    Slow,
}

pub type FlagState = EnumSet<Flag>;
