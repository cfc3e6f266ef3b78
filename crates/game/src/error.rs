use crate::character::CharacterId;

/// An action attempted in a state that forbids it. Always degrades to a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectedTransition {
    #[error("already attacking")]
    AlreadyAttacking,
    #[error("cannot change weapon mid-swing")]
    WeaponLockedMidSwing,
    #[error("not moving forward")]
    NotMovingForward,
    #[error("already sprinting")]
    AlreadySprinting,
    #[error("not sprinting")]
    NotSprinting,
    #[error("movement axis is not a finite number")]
    NonFiniteAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("rejected transition: {0}")]
    Rejected(#[from] RejectedTransition),
    #[error("{origin} may not request this for character {character}")]
    Unauthorized {
        origin: crate::net::Origin,
        character: CharacterId,
    },
    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),
    #[error("character {0} is not attacking")]
    NotAttacking(CharacterId),
    #[error("character {0} cannot hit itself")]
    SelfHit(CharacterId),
    #[error("character {victim} was already hit this swing by {attacker}")]
    DuplicateHit {
        attacker: CharacterId,
        victim: CharacterId,
    },
}

impl ProposalError {
    /// Rejections the originator should be corrected for with a fresh snapshot.
    pub fn needs_correction(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Unauthorized { .. })
    }
}
