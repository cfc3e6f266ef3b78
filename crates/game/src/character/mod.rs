mod entity;
mod roster;

pub use entity::{Character, CharacterId};
pub use roster::Roster;
