mod cue;
mod input;
mod prediction;

pub use cue::{AnimationCue, Perspective};
pub use input::InputEvent;
pub use prediction::Replica;
