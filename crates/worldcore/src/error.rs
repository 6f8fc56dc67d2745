use snafu::Snafu;

use crate::ids::{EntityId, SkillId};

/// Every typed failure the core can surface.
///
/// Contract violations and state-machine rejections (see spec §7, kinds 1
/// and 2) are always represented here and returned, never panicked.
/// Infrastructure failures (kind 3: repository I/O, publisher backlog) are
/// the caller's concern; this core only logs them and continues the tick
/// (see [`crate::scheduler::Scheduler::tick`]).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    #[snafu(display("player not found: {id}"))]
    PlayerNotFound { id: EntityId },

    #[snafu(display("player is offline: {id}"))]
    PlayerOffline { id: EntityId },

    #[snafu(display("player already exists: {name}"))]
    PlayerAlreadyExists { name: String },

    #[snafu(display("invalid player name: {name}"))]
    InvalidPlayerName { name: String },

    #[snafu(display("invalid position: ({x}, {y}, {z})"))]
    InvalidPosition { x: f32, y: f32, z: f32 },

    #[snafu(display("version mismatch: expected {expected}, found {found}"))]
    VersionMismatch { expected: u64, found: u64 },

    #[snafu(display("entity not found: {id}"))]
    UnknownEntity { id: EntityId },

    #[snafu(display("entity already present in map: {id}"))]
    EntityAlreadyPresent { id: EntityId },

    #[snafu(display("entity is not an actor: {id}"))]
    NotAnActor { id: EntityId },

    #[snafu(display("unknown skill: {id}"))]
    UnknownSkill { id: SkillId },

    #[snafu(display("skill cast rejected: {reason}"))]
    SkillRejected { reason: &'static str },

    #[snafu(display("deferred task channel is full, task dropped"))]
    ChannelFull,
}

pub type CoreResult<T> = Result<T, CoreError>;
