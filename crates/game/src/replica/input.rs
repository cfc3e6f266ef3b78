use crate::combat::Weapon;
use crate::net::Proposal;

/// Player intent after device binding. Axis values are in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    AttackPressed,
    SprintPressed,
    SprintReleased,
    WeaponSelect(Weapon),
    MoveForward(f32),
    MoveRight(f32),
}

impl InputEvent {
    pub fn to_proposal(self) -> Proposal {
        match self {
            Self::AttackPressed => Proposal::BeginAttack,
            Self::SprintPressed => Proposal::StartSprint,
            Self::SprintReleased => Proposal::StopSprint,
            Self::WeaponSelect(weapon) => Proposal::SetWeapon(weapon),
            Self::MoveForward(value) => Proposal::MoveForward(value.clamp(-1.0, 1.0)),
            Self::MoveRight(value) => Proposal::MoveRight(value.clamp(-1.0, 1.0)),
        }
    }

    /// Number keys 1-5 pick a weapon, anything else empties the hands.
    pub fn weapon_slot(slot: u8) -> Self {
        Self::WeaponSelect(Weapon::from(slot))
    }
}
