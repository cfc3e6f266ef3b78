use std::collections::HashMap;

use glam::Vec3;

use crate::character::{Character, CharacterId, Roster};
use crate::combat::CombatResolver;
use crate::error::{ProposalError, RejectedTransition};
use crate::movement::SpeedEvent;
use crate::net::{Ack, Broadcast, Origin, Proposal, ProposalEnvelope, StateDelta};

use super::config::SessionConfig;
use super::tick::FixedTimestep;

/// The single writer for every character's authoritative state. Proposals are validated and
/// applied in arrival order, and each accepted change comes back as a broadcast for all replicas.
pub struct Authority {
    config: SessionConfig,
    roster: Roster,
    resolver: CombatResolver,
    timestep: FixedTimestep,
    tick: u32,
    swing_elapsed: HashMap<CharacterId, f32>,
}

impl Default for Authority {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Authority {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            roster: Roster::with_config(config.movement.clone()),
            resolver: CombatResolver::new(),
            timestep: FixedTimestep::new(config.tick_rate),
            tick: 0,
            swing_elapsed: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.roster.get(id)
    }

    pub fn join(&mut self, position: Vec3, yaw: f32) -> (CharacterId, Broadcast) {
        let id = self.roster.spawn_character_at(position, yaw);
        log::info!("Character {} joined", id);

        let deltas = self
            .roster
            .get(id)
            .map(|character| StateDelta::Joined(character.to_network_state()))
            .into_iter()
            .collect();
        (id, Broadcast::with_deltas(self.tick, deltas))
    }

    pub fn leave(&mut self, id: CharacterId) -> Option<Broadcast> {
        self.roster.despawn(id)?;
        self.swing_elapsed.remove(&id);
        log::info!("Character {} left", id);
        Some(Broadcast::with_deltas(
            self.tick,
            vec![StateDelta::Left { character: id }],
        ))
    }

    /// Full state of every character, for late joiners and periodic reconciliation.
    pub fn snapshot(&self) -> Broadcast {
        Broadcast::with_deltas(
            self.tick,
            self.roster
                .snapshot_all()
                .into_iter()
                .map(StateDelta::Snapshot)
                .collect(),
        )
    }

    /// Handles a proposal without ever failing. Rejections are logged and degrade to a no-op;
    /// a rejected client prediction is answered with a snapshot of the addressed character.
    pub fn handle(&mut self, envelope: ProposalEnvelope) -> Broadcast {
        let ack = match envelope.origin {
            Origin::Client(sender) => Some(Ack {
                character: sender,
                sequence: envelope.sequence,
            }),
            Origin::Authority => None,
        };

        let mut broadcast = match self.propose(envelope) {
            Ok(broadcast) => broadcast,
            Err(e) => {
                log::debug!(
                    "Ignoring {:?} from {} for {}: {}",
                    envelope.proposal,
                    envelope.origin,
                    envelope.character,
                    e
                );
                let mut broadcast = Broadcast::new(self.tick);
                if e.needs_correction() && ack.is_some() {
                    if let Some(character) = self.roster.get(envelope.character) {
                        broadcast
                            .deltas
                            .push(StateDelta::Snapshot(character.to_network_state()));
                    }
                }
                broadcast
            }
        };
        broadcast.ack = ack;
        broadcast
    }

    pub fn propose(&mut self, envelope: ProposalEnvelope) -> Result<Broadcast, ProposalError> {
        self.authorize(&envelope)?;
        let deltas = self.apply(envelope.character, envelope.proposal)?;
        Ok(Broadcast::with_deltas(self.tick, deltas))
    }

    /// Entry point for the physics collaborator's weapon overlaps.
    pub fn deliver_overlap(
        &mut self,
        attacker: CharacterId,
        victim: CharacterId,
    ) -> Result<Broadcast, ProposalError> {
        self.propose(ProposalEnvelope::from_authority(
            attacker,
            Proposal::Overlap { victim },
        ))
    }

    pub fn end_attack(&mut self, character: CharacterId) -> Result<Broadcast, ProposalError> {
        self.propose(ProposalEnvelope::from_authority(
            character,
            Proposal::EndAttack,
        ))
    }

    fn authorize(&self, envelope: &ProposalEnvelope) -> Result<(), ProposalError> {
        if let Origin::Client(sender) = envelope.origin {
            if sender != envelope.character || envelope.proposal.is_authority_only() {
                return Err(ProposalError::Unauthorized {
                    origin: envelope.origin,
                    character: envelope.character,
                });
            }
        }
        if !self.roster.contains(envelope.character) {
            return Err(ProposalError::UnknownCharacter(envelope.character));
        }
        Ok(())
    }

    fn apply(
        &mut self,
        id: CharacterId,
        proposal: Proposal,
    ) -> Result<Vec<StateDelta>, ProposalError> {
        let delta = match proposal {
            Proposal::Overlap { victim } => {
                let report = self.resolver.resolve(&mut self.roster, id, victim)?;
                log::info!(
                    "{} hit {} for {} ({} left)",
                    report.attacker,
                    report.victim,
                    report.damage,
                    report.victim_health
                );
                StateDelta::Damaged {
                    attacker: report.attacker,
                    victim: report.victim,
                    amount: report.damage,
                    health: report.victim_health,
                }
            }
            Proposal::BeginAttack => {
                let character = self.roster.try_get_mut(id)?;
                character.combat.begin_attack()?;
                self.swing_elapsed.insert(id, 0.0);
                StateDelta::AttackStarted {
                    character: id,
                    weapon: character.combat.weapon(),
                }
            }
            Proposal::EndAttack => {
                self.roster.try_get_mut(id)?.combat.end_attack();
                self.swing_elapsed.remove(&id);
                StateDelta::AttackEnded { character: id }
            }
            Proposal::SetWeapon(weapon) => {
                self.roster.try_get_mut(id)?.combat.set_weapon(weapon)?;
                StateDelta::WeaponChanged {
                    character: id,
                    weapon,
                }
            }
            Proposal::StartSprint => {
                let character = self.roster.try_get_mut(id)?;
                let forward_speed = character.forward_speed();
                character.movement.start_sprint(forward_speed)?;
                StateDelta::SprintChanged {
                    character: id,
                    sprinting: true,
                }
            }
            Proposal::StopSprint => {
                self.roster.try_get_mut(id)?.movement.stop_sprint()?;
                StateDelta::SprintChanged {
                    character: id,
                    sprinting: false,
                }
            }
            Proposal::MoveForward(value) | Proposal::MoveRight(value) => {
                if !value.is_finite() {
                    return Err(RejectedTransition::NonFiniteAxis.into());
                }
                let character = self.roster.try_get_mut(id)?;
                let before = character.move_axes();
                if matches!(proposal, Proposal::MoveForward(_)) {
                    character.set_move_forward(value);
                } else {
                    character.set_move_right(value);
                }
                let axes = character.move_axes();
                if axes == before {
                    return Ok(Vec::new());
                }
                StateDelta::MoveInput {
                    character: id,
                    forward: axes.x,
                    right: axes.y,
                }
            }
        };

        Ok(vec![delta])
    }

    /// Runs every fixed tick that came due and returns one broadcast per tick with changes.
    pub fn advance(&mut self, delta: f32) -> Vec<Broadcast> {
        self.timestep.accumulate(delta);

        let mut broadcasts = Vec::new();
        while self.timestep.consume_tick() {
            let broadcast = self.step();
            if !broadcast.is_empty() {
                broadcasts.push(broadcast);
            }
        }
        broadcasts
    }

    fn step(&mut self) -> Broadcast {
        let dt = self.timestep.dt();
        let mut deltas = Vec::new();

        for id in self.roster.ids() {
            let Some(character) = self.roster.get_mut(id) else {
                continue;
            };

            character.refresh_velocity();
            let forward_speed = character.forward_speed();
            for event in character.movement.advance(dt, forward_speed) {
                deltas.push(match event {
                    SpeedEvent::MaxSpeedChanged(max_speed) => StateDelta::MaxSpeedChanged {
                        character: id,
                        max_speed,
                    },
                    SpeedEvent::SprintEnded => StateDelta::SprintChanged {
                        character: id,
                        sprinting: false,
                    },
                });
            }
            character.integrate(dt);

            if let Some(duration) = self.config.swing_duration {
                if let Some(elapsed) = self.swing_elapsed.get_mut(&id) {
                    *elapsed += dt;
                    if *elapsed + 1e-5 >= duration {
                        self.swing_elapsed.remove(&id);
                        character.combat.end_attack();
                        deltas.push(StateDelta::AttackEnded { character: id });
                    }
                }
            }
        }

        self.tick = self.tick.wrapping_add(1);

        if self.config.snapshot_interval > 0 && self.tick % self.config.snapshot_interval == 0 {
            deltas.extend(
                self.roster
                    .snapshot_all()
                    .into_iter()
                    .map(StateDelta::Snapshot),
            );
        }

        Broadcast::with_deltas(self.tick, deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Weapon;

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            snapshot_interval: 0,
            ..Default::default()
        }
    }

    fn client(id: CharacterId, sequence: u32, proposal: Proposal) -> ProposalEnvelope {
        ProposalEnvelope {
            sequence,
            origin: Origin::Client(id),
            character: id,
            proposal,
        }
    }

    fn run_for(authority: &mut Authority, seconds: f32) -> Vec<Broadcast> {
        let dt = authority.timestep.dt();
        let steps = (seconds / dt).round() as usize;
        (0..steps).flat_map(|_| authority.advance(dt)).collect()
    }

    #[test]
    fn join_broadcasts_fresh_character() {
        let mut authority = Authority::new(quiet_config());
        let (id, broadcast) = authority.join(Vec3::ZERO, 0.0);

        match broadcast.deltas.as_slice() {
            [StateDelta::Joined(state)] => {
                assert_eq!(state.character, id);
                assert_eq!(state.health, 100.0);
                assert_eq!(state.weapon, Weapon::None);
                assert_eq!(state.max_speed, 300.0);
            }
            other => panic!("unexpected deltas {:?}", other),
        }
    }

    #[test]
    fn accepted_proposal_is_acked_and_broadcast() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);

        let broadcast = authority.handle(client(id, 4, Proposal::SetWeapon(Weapon::Dagger)));
        assert_eq!(
            broadcast.ack,
            Some(Ack {
                character: id,
                sequence: 4
            })
        );
        assert_eq!(
            broadcast.deltas,
            vec![StateDelta::WeaponChanged {
                character: id,
                weapon: Weapon::Dagger
            }]
        );
    }

    #[test]
    fn clients_cannot_drive_authority_only_transitions() {
        let mut authority = Authority::new(quiet_config());
        let (attacker, _) = authority.join(Vec3::ZERO, 0.0);
        let (victim, _) = authority.join(Vec3::ZERO, 0.0);
        authority.handle(client(attacker, 1, Proposal::SetWeapon(Weapon::Longsword)));
        authority.handle(client(attacker, 2, Proposal::BeginAttack));

        let forged_hit = client(attacker, 3, Proposal::Overlap { victim });
        assert!(matches!(
            authority.propose(forged_hit),
            Err(ProposalError::Unauthorized { .. })
        ));
        assert!(matches!(
            authority.propose(client(attacker, 4, Proposal::EndAttack)),
            Err(ProposalError::Unauthorized { .. })
        ));

        let character = authority.character(attacker).unwrap();
        assert!(character.combat.is_attacking());
        assert_eq!(authority.character(victim).unwrap().combat.health(), 100.0);
    }

    #[test]
    fn clients_cannot_act_for_others() {
        let mut authority = Authority::new(quiet_config());
        let (a, _) = authority.join(Vec3::ZERO, 0.0);
        let (b, _) = authority.join(Vec3::ZERO, 0.0);

        let impostor = ProposalEnvelope {
            sequence: 1,
            origin: Origin::Client(a),
            character: b,
            proposal: Proposal::SetWeapon(Weapon::Spear),
        };
        let broadcast = authority.handle(impostor);

        assert_eq!(authority.character(b).unwrap().combat.weapon(), Weapon::None);
        assert!(matches!(
            broadcast.deltas.as_slice(),
            [StateDelta::Snapshot(state)] if state.character == b
        ));
    }

    #[test]
    fn rejected_prediction_gets_corrected() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);

        // Standing still, so the sprint is refused.
        let broadcast = authority.handle(client(id, 1, Proposal::StartSprint));
        match broadcast.deltas.as_slice() {
            [StateDelta::Snapshot(state)] => {
                assert!(!state.flags().contains(crate::net::CharacterFlags::SPRINTING))
            }
            other => panic!("unexpected deltas {:?}", other),
        }
    }

    #[test]
    fn non_finite_axis_is_rejected_and_sprint_stays_locked() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);

        for value in [f32::NAN, f32::INFINITY] {
            assert!(matches!(
                authority.propose(client(id, 1, Proposal::MoveForward(value))),
                Err(ProposalError::Rejected(RejectedTransition::NonFiniteAxis))
            ));
        }
        let broadcast = authority.handle(client(id, 2, Proposal::MoveRight(f32::NAN)));
        assert!(matches!(broadcast.deltas.as_slice(), [StateDelta::Snapshot(_)]));

        assert!(authority.propose(client(id, 3, Proposal::StartSprint)).is_err());
        run_for(&mut authority, 1.0);

        let character = authority.character(id).unwrap();
        assert!(!character.movement.is_sprinting());
        assert_eq!(character.movement.max_speed(), 300.0);
        assert!(character.position.is_finite());
    }

    #[test]
    fn duplicate_hits_are_silent() {
        let mut authority = Authority::new(quiet_config());
        let (attacker, _) = authority.join(Vec3::ZERO, 0.0);
        let (victim, _) = authority.join(Vec3::ZERO, 0.0);
        authority.handle(client(attacker, 1, Proposal::SetWeapon(Weapon::Halberd)));
        authority.handle(client(attacker, 2, Proposal::BeginAttack));

        assert!(authority.deliver_overlap(attacker, victim).is_ok());
        assert!(matches!(
            authority.deliver_overlap(attacker, victim),
            Err(ProposalError::DuplicateHit { .. })
        ));

        let broadcast = authority.handle(ProposalEnvelope::from_authority(
            attacker,
            Proposal::Overlap { victim },
        ));
        assert!(broadcast.is_empty());
        assert_eq!(authority.character(victim).unwrap().combat.health(), 75.0);
    }

    #[test]
    fn sprint_ramps_on_fixed_ticks() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);
        authority.handle(client(id, 1, Proposal::MoveForward(1.0)));
        authority.handle(client(id, 2, Proposal::StartSprint));

        let broadcasts = run_for(&mut authority, 0.5);
        let speeds: Vec<f32> = broadcasts
            .iter()
            .flat_map(|b| &b.deltas)
            .filter_map(|d| match d {
                StateDelta::MaxSpeedChanged { max_speed, .. } => Some(*max_speed),
                _ => None,
            })
            .collect();

        assert_eq!(speeds, vec![350.0, 400.0, 450.0, 500.0, 550.0]);
        assert_eq!(authority.character(id).unwrap().movement.max_speed(), 550.0);
    }

    #[test]
    fn releasing_forward_stops_sprint_and_snaps_back() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);
        authority.handle(client(id, 1, Proposal::MoveForward(1.0)));
        authority.handle(client(id, 2, Proposal::StartSprint));
        run_for(&mut authority, 0.3);

        authority.handle(client(id, 3, Proposal::MoveForward(0.0)));
        run_for(&mut authority, 0.1);
        let character = authority.character(id).unwrap();
        assert!(!character.movement.is_sprinting());

        run_for(&mut authority, 0.2);
        assert_eq!(authority.character(id).unwrap().movement.max_speed(), 300.0);
    }

    #[test]
    fn swing_timer_ends_attack() {
        let mut authority = Authority::new(SessionConfig {
            snapshot_interval: 0,
            swing_duration: Some(0.5),
            ..Default::default()
        });
        let (id, _) = authority.join(Vec3::ZERO, 0.0);
        authority.handle(client(id, 1, Proposal::BeginAttack));

        run_for(&mut authority, 0.25);
        assert!(authority.character(id).unwrap().combat.is_attacking());

        let broadcasts = run_for(&mut authority, 0.25);
        assert!(!authority.character(id).unwrap().combat.is_attacking());
        assert!(
            broadcasts
                .iter()
                .flat_map(|b| &b.deltas)
                .any(|d| *d == StateDelta::AttackEnded { character: id })
        );
    }

    #[test]
    fn periodic_snapshots() {
        let mut authority = Authority::new(SessionConfig {
            snapshot_interval: 10,
            ..Default::default()
        });
        authority.join(Vec3::ZERO, 0.0);
        authority.join(Vec3::ZERO, 0.0);

        let broadcasts = run_for(&mut authority, 20.0 / 60.0);
        assert_eq!(broadcasts.len(), 2);
        assert!(
            broadcasts
                .iter()
                .all(|b| b.deltas.len() == 2 && b.tick % 10 == 0)
        );
    }

    #[test]
    fn leave_removes_character() {
        let mut authority = Authority::new(quiet_config());
        let (id, _) = authority.join(Vec3::ZERO, 0.0);
        assert!(authority.leave(id).is_some());
        assert!(authority.leave(id).is_none());
        assert!(matches!(
            authority.propose(client(id, 1, Proposal::BeginAttack)),
            Err(ProposalError::UnknownCharacter(_))
        ));
    }
}
