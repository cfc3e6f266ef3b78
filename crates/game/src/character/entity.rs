use std::fmt;

use glam::{Quat, Vec2, Vec3};
use rkyv::{Archive, Deserialize, Serialize};

use crate::combat::CombatState;
use crate::movement::{MovementConfig, MovementSpeedController};
use crate::net::{CharacterFlags, CharacterState};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Archive,
    Serialize,
    Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct CharacterId(pub u32);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-finite input counts as released.
fn axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: CharacterId,
    pub combat: CombatState,
    pub movement: MovementSpeedController,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    move_axes: Vec2,
}

impl Character {
    pub fn new(id: CharacterId, config: MovementConfig) -> Self {
        Self {
            id,
            combat: CombatState::new(),
            movement: MovementSpeedController::new(config),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            move_axes: Vec2::ZERO,
        }
    }

    pub fn spawned_at(id: CharacterId, config: MovementConfig, position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            ..Self::new(id, config)
        }
    }

    pub fn facing(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::NEG_X
    }

    /// Velocity projected onto the facing direction.
    pub fn forward_speed(&self) -> f32 {
        self.velocity.dot(self.facing())
    }

    pub fn move_axes(&self) -> Vec2 {
        self.move_axes
    }

    pub fn set_move_forward(&mut self, value: f32) {
        self.move_axes.x = axis(value);
        self.refresh_velocity();
    }

    pub fn set_move_right(&mut self, value: f32) {
        self.move_axes.y = axis(value);
        self.refresh_velocity();
    }

    pub fn apply_move_input(&mut self, forward: f32, right: f32) {
        self.move_axes = Vec2::new(axis(forward), axis(right));
        self.refresh_velocity();
    }

    /// Recomputes velocity from the held axes and the current max speed.
    pub fn refresh_velocity(&mut self) {
        let wish = self.facing() * self.move_axes.x + self.right() * self.move_axes.y;
        let wish = if wish.length_squared() > 1.0 {
            wish.normalize()
        } else {
            wish
        };
        self.velocity = wish * self.movement.max_speed();
    }

    pub fn integrate(&mut self, dt: f32) {
        self.refresh_velocity();
        self.position += self.velocity * dt;
    }

    pub fn flags(&self) -> CharacterFlags {
        let mut flags = CharacterFlags::empty();
        flags.set(CharacterFlags::ATTACKING, self.combat.is_attacking());
        flags.set(CharacterFlags::HIT_DETECTION, self.combat.hit_detection());
        flags.set(CharacterFlags::SPRINTING, self.movement.is_sprinting());
        flags
    }

    pub fn to_network_state(&self) -> CharacterState {
        CharacterState {
            character: self.id,
            health: self.combat.health(),
            weapon: self.combat.weapon(),
            flags: self.flags().bits(),
            max_speed: self.movement.max_speed(),
            position: self.position.into(),
            velocity: self.velocity.into(),
            yaw: self.yaw,
        }
    }

    pub fn from_network_state(state: &CharacterState, config: MovementConfig) -> Self {
        let mut character = Self::new(state.character, config);
        character.apply_network_state(state);
        character
    }

    pub fn apply_network_state(&mut self, state: &CharacterState) {
        let flags = CharacterFlags::from_bits_truncate(state.flags);
        self.combat.apply_authoritative(
            state.health,
            state.weapon,
            flags.contains(CharacterFlags::ATTACKING),
        );
        self.movement
            .apply_authoritative(state.max_speed, flags.contains(CharacterFlags::SPRINTING));
        self.position = Vec3::from(state.position);
        self.velocity = Vec3::from(state.velocity);
        self.yaw = state.yaw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Weapon;

    #[test]
    fn forward_speed_follows_axes() {
        let mut character = Character::new(CharacterId(1), MovementConfig::default());
        assert_eq!(character.forward_speed(), 0.0);

        character.set_move_forward(1.0);
        assert!((character.forward_speed() - 300.0).abs() < 0.001);

        character.set_move_forward(-0.5);
        assert!((character.forward_speed() + 150.0).abs() < 0.001);

        character.set_move_forward(0.0);
        character.set_move_right(1.0);
        assert!(character.forward_speed().abs() < 0.001);
        assert!((character.velocity.length() - 300.0).abs() < 0.001);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let mut character = Character::new(CharacterId(1), MovementConfig::default());
        character.set_move_forward(1.0);
        character.set_move_right(1.0);
        assert!((character.velocity.length() - 300.0).abs() < 0.001);

        character.apply_move_input(3.0, 0.0);
        assert_eq!(character.move_axes(), Vec2::new(1.0, 0.0));
        assert!((character.forward_speed() - 300.0).abs() < 0.001);
    }

    #[test]
    fn non_finite_axes_count_as_released() {
        let mut character = Character::new(CharacterId(1), MovementConfig::default());
        character.set_move_forward(f32::NAN);
        character.set_move_right(f32::INFINITY);
        assert_eq!(character.move_axes(), Vec2::ZERO);

        character.integrate(1.0);
        assert!(character.position.is_finite());
        assert_eq!(character.forward_speed(), 0.0);
    }

    #[test]
    fn integrate_moves_along_facing() {
        let mut character = Character::spawned_at(
            CharacterId(1),
            MovementConfig::default(),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_2,
        );
        character.set_move_forward(1.0);
        character.integrate(0.5);
        assert!((character.position - character.facing() * 150.0).length() < 0.01);
    }

    #[test]
    fn network_roundtrip() {
        let mut character = Character::new(CharacterId(7), MovementConfig::default());
        character.combat.set_weapon(Weapon::Halberd).unwrap();
        character.combat.begin_attack().unwrap();
        character.position = Vec3::new(10.0, 0.0, -4.0);

        let state = character.to_network_state();
        let reconstructed = Character::from_network_state(&state, MovementConfig::default());

        assert_eq!(reconstructed.id, CharacterId(7));
        assert_eq!(reconstructed.combat.weapon(), Weapon::Halberd);
        assert!(reconstructed.combat.is_attacking());
        assert!(reconstructed.combat.hit_detection());
        assert!((reconstructed.position - character.position).length() < 0.001);
    }
}
