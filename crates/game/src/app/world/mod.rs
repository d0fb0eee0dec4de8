//! Rooms, things and the rules that connect them.

pub(crate) mod catalog;
pub(crate) mod entities;
pub(crate) mod flags;
pub(crate) mod game;
pub(crate) mod player;
pub(crate) mod progress;
pub(crate) mod registry;
pub(crate) mod room;
pub(crate) mod thing;

pub(crate) use catalog::{ItemRef, MaterialType, PotionType, PuzzleObjectType};
pub(crate) use entities::NpcType;
pub(crate) use flags::Flags;
pub(crate) use game::{Game, GameDeps, GameError};
pub(crate) use progress::Progress;
pub(crate) use registry::Registry;
pub(crate) use room::Room;
pub(crate) use thing::{RoomId, ThingId};
