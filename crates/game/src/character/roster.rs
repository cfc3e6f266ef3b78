use std::collections::HashMap;

use glam::Vec3;

use crate::error::ProposalError;
use crate::movement::MovementConfig;
use crate::net::CharacterState;

use super::entity::{Character, CharacterId};

#[derive(Debug)]
pub struct Roster {
    characters: HashMap<CharacterId, Character>,
    next_id: u32,
    config: MovementConfig,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub fn new() -> Self {
        Self::with_config(MovementConfig::default())
    }

    pub fn with_config(config: MovementConfig) -> Self {
        Self {
            characters: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn spawn_character(&mut self) -> CharacterId {
        self.spawn_character_at(Vec3::ZERO, 0.0)
    }

    pub fn spawn_character_at(&mut self, position: Vec3, yaw: f32) -> CharacterId {
        let id = CharacterId(self.next_id);
        self.next_id += 1;
        let character = Character::spawned_at(id, self.config.clone(), position, yaw);
        self.characters.insert(id, character);
        id
    }

    /// Inserts or overwrites a character from an authoritative snapshot.
    pub fn upsert(&mut self, state: &CharacterState) -> &mut Character {
        if state.character.0 >= self.next_id {
            self.next_id = state.character.0 + 1;
        }
        let config = &self.config;
        let character = self
            .characters
            .entry(state.character)
            .or_insert_with(|| Character::new(state.character, config.clone()));
        character.apply_network_state(state);
        character
    }

    pub fn despawn(&mut self, id: CharacterId) -> Option<Character> {
        self.characters.remove(&id)
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.characters.contains_key(&id)
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn try_get_mut(&mut self, id: CharacterId) -> Result<&mut Character, ProposalError> {
        self.characters
            .get_mut(&id)
            .ok_or(ProposalError::UnknownCharacter(id))
    }

    /// Borrows two distinct characters mutably at once.
    pub fn pair_mut(
        &mut self,
        first: CharacterId,
        second: CharacterId,
    ) -> Result<(&mut Character, &mut Character), ProposalError> {
        if first == second {
            return Err(ProposalError::SelfHit(first));
        }

        let mut a = None;
        let mut b = None;
        for (id, character) in self.characters.iter_mut() {
            if *id == first {
                a = Some(character);
            } else if *id == second {
                b = Some(character);
            }
        }

        match (a, b) {
            (Some(a), Some(b)) => Ok((a, b)),
            (None, _) => Err(ProposalError::UnknownCharacter(first)),
            (_, None) => Err(ProposalError::UnknownCharacter(second)),
        }
    }

    pub fn ids(&self) -> Vec<CharacterId> {
        let mut ids: Vec<CharacterId> = self.characters.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn characters_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.characters.values_mut()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn snapshot_all(&self) -> Vec<CharacterState> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.get(id))
            .map(Character::to_network_state)
            .collect()
    }
}
