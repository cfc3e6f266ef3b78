use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use glam::Vec3;

use melee::{
    Authority, AuthorityEndpoint, Broadcast, ChannelError, CharacterId, PeerEndpoint,
    ProposalError, ReplicationChannel, StateDelta,
};

use crate::config::ServerConfig;
use crate::events::ServerEvent;

/// Cosine of the half-angle of the cone in front of an attacker that a swing can reach.
const SWING_CONE_COS: f32 = 0.5;

pub struct GameServer {
    authority: Authority,
    endpoint: AuthorityEndpoint,
    config: ServerConfig,
    last_tick_time: Instant,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Self {
        let session = config.session();
        let endpoint = ReplicationChannel::open(session.broadcast_capacity);

        Self {
            authority: Authority::new(session),
            endpoint,
            config,
            last_tick_time: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    /// Spawns a character and hands back the endpoint its owner talks through.
    pub fn join_player(
        &mut self,
        position: Vec3,
        yaw: f32,
    ) -> Result<(CharacterId, PeerEndpoint), ChannelError> {
        let (character, joined) = self.authority.join(position, yaw);
        let peer = self.endpoint.connect(character);
        self.endpoint.publish(&joined)?;

        // The newcomer has not seen anyone who joined before it.
        let snapshot = self.authority.snapshot();
        self.endpoint.publish(&snapshot)?;

        self.pending_events
            .push_back(ServerEvent::PlayerJoined { character });
        Ok((character, peer))
    }

    pub fn leave_player(&mut self, character: CharacterId) {
        if let Some(left) = self.authority.leave(character) {
            self.publish(&left);
            self.pending_events
                .push_back(ServerEvent::PlayerLeft { character });
        }
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for character in self.authority.roster().ids() {
            self.leave_player(character);
        }
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        self.last_tick_time = now;
        self.step(delta.as_secs_f32());
    }

    pub fn step(&mut self, delta: f32) {
        self.process_proposals();

        for broadcast in self.authority.advance(delta) {
            self.publish(&broadcast);
        }

        self.resolve_overlaps();
    }

    fn process_proposals(&mut self) {
        for envelope in self.endpoint.drain() {
            let broadcast = self.authority.handle(envelope);
            if !broadcast.is_empty() {
                self.publish(&broadcast);
            }
        }
    }

    /// Stands in for weapon collision: any character inside an active swing's reach and in front
    /// of the attacker counts as overlapped.
    fn weapon_overlaps(&self) -> Vec<(CharacterId, CharacterId)> {
        let roster = self.authority.roster();
        let mut overlaps = Vec::new();

        for attacker in roster.characters() {
            if !attacker.combat.hit_detection() {
                continue;
            }
            let facing = attacker.facing();
            for victim in roster.characters() {
                if victim.id == attacker.id {
                    continue;
                }
                let offset = victim.position - attacker.position;
                if offset.length() <= self.config.reach
                    && offset.normalize_or_zero().dot(facing) >= SWING_CONE_COS
                {
                    overlaps.push((attacker.id, victim.id));
                }
            }
        }

        overlaps.sort();
        overlaps
    }

    fn resolve_overlaps(&mut self) {
        for (attacker, victim) in self.weapon_overlaps() {
            match self.authority.deliver_overlap(attacker, victim) {
                Ok(broadcast) => {
                    for delta in &broadcast.deltas {
                        if let StateDelta::Damaged { health, .. } = *delta {
                            self.pending_events.push_back(ServerEvent::Hit {
                                attacker,
                                victim,
                                health,
                            });
                        }
                    }
                    self.publish(&broadcast);
                }
                Err(ProposalError::DuplicateHit { .. }) => {}
                Err(e) => log::debug!("Overlap {} -> {} ignored: {}", attacker, victim, e),
            }
        }
    }

    fn publish(&mut self, broadcast: &Broadcast) {
        if let Err(e) = self.endpoint.publish(broadcast) {
            self.pending_events.push_back(ServerEvent::Error {
                message: format!("Broadcast failed: {}", e),
            });
        }
    }
}
