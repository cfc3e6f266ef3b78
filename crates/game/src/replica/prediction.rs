use std::collections::VecDeque;

use crate::character::{Character, CharacterId, Roster};
use crate::combat::AnimationKind;
use crate::movement::{MovementConfig, SpeedEvent};
use crate::net::{
    Ack, Broadcast, Origin, Proposal, ProposalEnvelope, StateDelta, sequence_at_most,
    sequence_greater_than,
};

use super::cue::{AnimationCue, Perspective};
use super::input::InputEvent;

const MAX_PENDING_PROPOSALS: usize = 128;

#[derive(Debug, Clone, Copy)]
struct PendingProposal {
    sequence: u32,
    proposal: Proposal,
}

/// A participant's mirror of the session. The owned character is predicted from local input;
/// every broadcast overwrites the mirror with the authority's values.
pub struct Replica {
    local: CharacterId,
    roster: Roster,
    pending: VecDeque<PendingProposal>,
    next_sequence: u32,
    last_acked: u32,
    last_tick: u32,
}

impl Replica {
    pub fn new(local: CharacterId, config: MovementConfig) -> Self {
        Self {
            local,
            roster: Roster::with_config(config),
            pending: VecDeque::with_capacity(MAX_PENDING_PROPOSALS),
            next_sequence: 1,
            last_acked: 0,
            last_tick: 0,
        }
    }

    pub fn local(&self) -> CharacterId {
        self.local
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.roster.get(id)
    }

    pub fn local_character(&self) -> Option<&Character> {
        self.roster.get(self.local)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn last_acked(&self) -> u32 {
        self.last_acked
    }

    pub fn last_tick(&self) -> u32 {
        self.last_tick
    }

    /// Applies the input optimistically and returns the proposal to send. The proposal is
    /// always sent, even when the local mirror refuses the prediction: only the authority rejects.
    pub fn handle_input(&mut self, input: InputEvent) -> (ProposalEnvelope, Vec<AnimationCue>) {
        let proposal = input.to_proposal();
        let cues = self.predict_proposal(proposal);

        let envelope = ProposalEnvelope {
            sequence: self.next_sequence,
            origin: Origin::Client(self.local),
            character: self.local,
            proposal,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);

        self.pending.push_back(PendingProposal {
            sequence: envelope.sequence,
            proposal,
        });
        while self.pending.len() > MAX_PENDING_PROPOSALS {
            self.pending.pop_front();
        }

        (envelope, cues)
    }

    fn predict_proposal(&mut self, proposal: Proposal) -> Vec<AnimationCue> {
        let local = self.local;
        let Some(character) = self.roster.get_mut(local) else {
            return Vec::new();
        };

        let mut cues = Vec::new();
        let predicted = match proposal {
            Proposal::BeginAttack => character.combat.begin_attack().map(|()| {
                cues.push(AnimationCue::new(
                    local,
                    character.combat.weapon(),
                    AnimationKind::Attack,
                    Perspective::FirstPerson,
                ));
            }),
            Proposal::SetWeapon(weapon) => character.combat.set_weapon(weapon),
            Proposal::StartSprint => {
                let forward_speed = character.forward_speed();
                character.movement.start_sprint(forward_speed)
            }
            Proposal::StopSprint => character.movement.stop_sprint(),
            Proposal::MoveForward(value) => {
                character.set_move_forward(value);
                Ok(())
            }
            Proposal::MoveRight(value) => {
                character.set_move_right(value);
                Ok(())
            }
            Proposal::EndAttack | Proposal::Overlap { .. } => Ok(()),
        };

        if let Err(e) = predicted {
            log::trace!("Not predicting {:?} for {}: {}", proposal, local, e);
        }
        cues
    }

    /// Runs the owned character's speed timers and kinematics, and dead-reckons everyone else.
    pub fn predict(&mut self, dt: f32) -> Vec<SpeedEvent> {
        let mut events = Vec::new();
        for character in self.roster.characters_mut() {
            if character.id == self.local {
                character.refresh_velocity();
                let forward_speed = character.forward_speed();
                events = character.movement.advance(dt, forward_speed);
            }
            character.integrate(dt);
        }
        events
    }

    /// Makes the broadcast canonical in the mirror and returns the cues it triggers.
    pub fn apply(&mut self, broadcast: &Broadcast) -> Vec<AnimationCue> {
        if sequence_greater_than(broadcast.tick, self.last_tick) {
            self.last_tick = broadcast.tick;
        }
        if let Some(ack) = broadcast.ack {
            self.acknowledge(ack);
        }

        let mut cues = Vec::new();
        for delta in &broadcast.deltas {
            self.apply_delta(delta, &mut cues);
        }
        cues
    }

    fn acknowledge(&mut self, ack: Ack) {
        if ack.character != self.local {
            return;
        }
        if sequence_greater_than(ack.sequence, self.last_acked) {
            self.last_acked = ack.sequence;
        }
        self.pending
            .retain(|pending| !sequence_at_most(pending.sequence, ack.sequence));
    }

    fn has_pending_move(&self) -> bool {
        self.pending.iter().any(|pending| {
            matches!(
                pending.proposal,
                Proposal::MoveForward(_) | Proposal::MoveRight(_)
            )
        })
    }

    fn apply_delta(&mut self, delta: &StateDelta, cues: &mut Vec<AnimationCue>) {
        match delta {
            StateDelta::Joined(state) | StateDelta::Snapshot(state) => {
                self.roster.upsert(state);
            }
            StateDelta::Left { character } => {
                self.roster.despawn(*character);
            }
            StateDelta::MoveInput {
                character,
                forward,
                right,
            } => {
                // The owner's own axes are ahead of the echo while moves are in flight.
                if *character == self.local && self.has_pending_move() {
                    return;
                }
                if let Some(target) = self.roster.get_mut(*character) {
                    target.apply_move_input(*forward, *right);
                }
            }
            StateDelta::Damaged {
                attacker,
                victim,
                health,
                ..
            } => {
                if let Some(source) = self.roster.get_mut(*attacker) {
                    source.combat.register_hit(*victim);
                }
                if let Some(target) = self.roster.get_mut(*victim) {
                    let weapon = target.combat.weapon();
                    let attacking = target.combat.is_attacking();
                    target
                        .combat
                        .apply_authoritative(*health, weapon, attacking);
                    cues.push(AnimationCue::new(
                        *victim,
                        weapon,
                        AnimationKind::Damage,
                        Perspective::ThirdPerson,
                    ));
                    if *victim == self.local {
                        cues.push(AnimationCue::new(
                            *victim,
                            weapon,
                            AnimationKind::Damage,
                            Perspective::FirstPerson,
                        ));
                    }
                }
            }
            _ => {
                let Some(target) = self.roster.get_mut(delta.character()) else {
                    log::debug!("Delta for unknown character {}", delta.character());
                    return;
                };
                let health = target.combat.health();
                let weapon = target.combat.weapon();
                let attacking = target.combat.is_attacking();
                let max_speed = target.movement.max_speed();
                let sprinting = target.movement.is_sprinting();

                match *delta {
                    StateDelta::AttackStarted { character, weapon } => {
                        target.combat.apply_authoritative(health, weapon, true);
                        cues.push(AnimationCue::new(
                            character,
                            weapon,
                            AnimationKind::Attack,
                            Perspective::ThirdPerson,
                        ));
                    }
                    StateDelta::AttackEnded { .. } => {
                        target.combat.apply_authoritative(health, weapon, false);
                    }
                    StateDelta::WeaponChanged { weapon, .. } => {
                        target.combat.apply_authoritative(health, weapon, attacking);
                    }
                    StateDelta::SprintChanged { sprinting, .. } => {
                        target.movement.apply_authoritative(max_speed, sprinting);
                    }
                    StateDelta::MaxSpeedChanged { max_speed, .. } => {
                        target.movement.apply_authoritative(max_speed, sprinting);
                    }
                    _ => {}
                }
            }
        }
    }
}
