use std::time::Duration;

use melee::{DEFAULT_TICK_RATE, SessionConfig};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub players: usize,
    /// Stop after this long. `None` runs until interrupted.
    pub duration: Option<Duration>,
    pub swing_duration: f32,
    /// Weapon reach used to turn proximity into overlap events.
    pub reach: f32,
    pub snapshot_interval: u32,
    pub arena_radius: f32,
    pub think_rate: u32,
    pub seed: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            players: 4,
            duration: None,
            swing_duration: 0.6,
            reach: 150.0,
            snapshot_interval: 30,
            arena_radius: 600.0,
            think_rate: 5,
            seed: 0,
        }
    }
}

impl ServerConfig {
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            tick_rate: self.tick_rate,
            snapshot_interval: self.snapshot_interval,
            swing_duration: Some(self.swing_duration),
            ..Default::default()
        }
    }
}
