use crate::character::{CharacterId, Roster};
use crate::error::ProposalError;

use super::weapon::Weapon;

/// Flat damage for every landed hit, independent of the weapon.
pub const DAMAGE_PER_HIT: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReport {
    pub attacker: CharacterId,
    pub victim: CharacterId,
    pub damage: f32,
    pub victim_health: f32,
    /// The victim's weapon, which keys its damage reaction.
    pub reaction_weapon: Weapon,
}

#[derive(Debug, Clone)]
pub struct CombatResolver {
    damage: f32,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self {
            damage: DAMAGE_PER_HIT,
        }
    }
}

impl CombatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Applies an overlap reported by the physics collaborator. At most one hit lands per
    /// (attacker, victim) pair per swing.
    pub fn resolve(
        &self,
        roster: &mut Roster,
        attacker_id: CharacterId,
        victim_id: CharacterId,
    ) -> Result<HitReport, ProposalError> {
        if attacker_id == victim_id {
            return Err(ProposalError::SelfHit(attacker_id));
        }

        let (attacker, victim) = roster.pair_mut(attacker_id, victim_id)?;

        if !attacker.combat.is_attacking() || !attacker.combat.hit_detection() {
            return Err(ProposalError::NotAttacking(attacker_id));
        }

        if !attacker.combat.register_hit(victim_id) {
            return Err(ProposalError::DuplicateHit {
                attacker: attacker_id,
                victim: victim_id,
            });
        }

        victim.combat.take_damage(self.damage);

        Ok(HitReport {
            attacker: attacker_id,
            victim: victim_id,
            damage: self.damage,
            victim_health: victim.combat.health(),
            reaction_weapon: victim.combat.weapon(),
        })
    }
}
