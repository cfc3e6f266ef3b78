use crate::character::CharacterId;
use crate::combat::{AnimationKind, Weapon};

/// Which mesh a cue targets: the owner's own view or the body everyone else sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perspective {
    FirstPerson,
    ThirdPerson,
}

/// Animation selector handed to the playback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationCue {
    pub character: CharacterId,
    pub weapon: Weapon,
    pub kind: AnimationKind,
    pub perspective: Perspective,
}

impl AnimationCue {
    pub fn new(
        character: CharacterId,
        weapon: Weapon,
        kind: AnimationKind,
        perspective: Perspective,
    ) -> Self {
        Self {
            character,
            weapon,
            kind,
            perspective,
        }
    }

    /// Resolved asset path, if the weapon has one for this kind.
    pub fn animation(&self) -> Option<&'static str> {
        self.weapon.spec().animation(self.kind)
    }
}
