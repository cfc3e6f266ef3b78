use std::collections::HashSet;

use crate::character::CharacterId;
use crate::error::RejectedTransition;

use super::weapon::{Weapon, WeaponSpec};

pub const STARTING_HEALTH: f32 = 100.0;

/// Mesh, pose and overlap state of the equipped weapon.
#[derive(Debug, Clone, Copy)]
pub struct WeaponBinding {
    pub spec: &'static WeaponSpec,
    pub hit_detection: bool,
}

impl WeaponBinding {
    fn bind(weapon: Weapon) -> Self {
        Self {
            spec: weapon.spec(),
            hit_detection: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CombatState {
    health: f32,
    weapon: Weapon,
    attacking: bool,
    hit_registry: HashSet<CharacterId>,
    binding: WeaponBinding,
}

impl Default for CombatState {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatState {
    pub fn new() -> Self {
        Self {
            health: STARTING_HEALTH,
            weapon: Weapon::None,
            attacking: false,
            hit_registry: HashSet::new(),
            binding: WeaponBinding::bind(Weapon::None),
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn weapon(&self) -> Weapon {
        self.weapon
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn binding(&self) -> &WeaponBinding {
        &self.binding
    }

    pub fn hit_detection(&self) -> bool {
        self.binding.hit_detection
    }

    pub fn hit_registry(&self) -> &HashSet<CharacterId> {
        &self.hit_registry
    }

    pub fn has_hit(&self, victim: CharacterId) -> bool {
        self.hit_registry.contains(&victim)
    }

    pub fn begin_attack(&mut self) -> Result<(), RejectedTransition> {
        if self.attacking {
            return Err(RejectedTransition::AlreadyAttacking);
        }
        self.attacking = true;
        self.binding.hit_detection = self.binding.spec.has_hit_volume();
        Ok(())
    }

    /// Ends the current swing. Valid in any state.
    pub fn end_attack(&mut self) {
        self.attacking = false;
        self.binding.hit_detection = false;
        self.hit_registry.clear();
    }

    pub fn set_weapon(&mut self, weapon: Weapon) -> Result<(), RejectedTransition> {
        if self.attacking {
            return Err(RejectedTransition::WeaponLockedMidSwing);
        }
        self.weapon = weapon;
        self.binding = WeaponBinding::bind(weapon);
        Ok(())
    }

    /// Returns false if the victim was already in this swing's registry.
    pub(crate) fn register_hit(&mut self, victim: CharacterId) -> bool {
        self.hit_registry.insert(victim)
    }

    pub(crate) fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
    }

    /// Overwrites local fields with the authority's view. Registry membership is not replicated.
    pub(crate) fn apply_authoritative(&mut self, health: f32, weapon: Weapon, attacking: bool) {
        self.health = health;
        if self.weapon != weapon {
            self.weapon = weapon;
            self.binding = WeaponBinding::bind(weapon);
        }
        if attacking && !self.attacking {
            self.attacking = true;
            self.binding.hit_detection = self.binding.spec.has_hit_volume();
        } else if !attacking && self.attacking {
            self.end_attack();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_begin_attack_succeeds() {
        let mut state = CombatState::new();
        state.set_weapon(Weapon::Longsword).unwrap();

        assert!(state.begin_attack().is_ok());
        for _ in 0..5 {
            assert_eq!(
                state.begin_attack(),
                Err(RejectedTransition::AlreadyAttacking)
            );
        }
        assert!(state.is_attacking());

        state.end_attack();
        assert!(state.begin_attack().is_ok());
    }

    #[test]
    fn hit_detection_follows_swing() {
        let mut state = CombatState::new();
        state.set_weapon(Weapon::Dagger).unwrap();
        assert!(!state.hit_detection());

        state.begin_attack().unwrap();
        assert!(state.hit_detection());

        state.end_attack();
        assert!(!state.hit_detection());
    }

    #[test]
    fn empty_hands_swing_without_hit_volume() {
        let mut state = CombatState::new();
        state.begin_attack().unwrap();
        assert!(state.is_attacking());
        assert!(!state.hit_detection());
    }

    #[test]
    fn weapon_locked_mid_swing() {
        let mut state = CombatState::new();
        state.set_weapon(Weapon::Spear).unwrap();
        state.begin_attack().unwrap();

        assert_eq!(
            state.set_weapon(Weapon::Halberd),
            Err(RejectedTransition::WeaponLockedMidSwing)
        );
        assert_eq!(state.weapon(), Weapon::Spear);
        assert_eq!(state.binding().spec.weapon, Weapon::Spear);
    }

    #[test]
    fn end_attack_clears_registry() {
        let mut state = CombatState::new();
        state.set_weapon(Weapon::Longsword).unwrap();
        state.begin_attack().unwrap();
        assert!(state.register_hit(CharacterId(2)));
        assert!(!state.register_hit(CharacterId(2)));
        assert!(state.register_hit(CharacterId(3)));

        state.end_attack();
        assert!(state.hit_registry().is_empty());
        assert!(!state.has_hit(CharacterId(2)));
    }

    #[test]
    fn end_attack_is_valid_when_idle() {
        let mut state = CombatState::new();
        state.end_attack();
        assert!(!state.is_attacking());
    }

    #[test]
    fn authoritative_state_overrides_prediction() {
        let mut state = CombatState::new();
        state.set_weapon(Weapon::Dagger).unwrap();
        state.begin_attack().unwrap();

        state.apply_authoritative(75.0, Weapon::Dagger, false);
        assert!(!state.is_attacking());
        assert!(!state.hit_detection());
        assert_eq!(state.health(), 75.0);

        state.apply_authoritative(75.0, Weapon::Halberd, false);
        assert_eq!(state.binding().spec.weapon, Weapon::Halberd);
    }
}
