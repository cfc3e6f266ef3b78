use crate::movement::MovementConfig;
use crate::net::{DEFAULT_BROADCAST_CAPACITY, DEFAULT_TICK_RATE};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tick_rate: u32,
    /// Full roster snapshot every N ticks. Zero disables periodic snapshots.
    pub snapshot_interval: u32,
    /// Ends swings automatically after this many seconds. `None` leaves it to the caller.
    pub swing_duration: Option<f32>,
    pub broadcast_capacity: usize,
    pub movement: MovementConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            snapshot_interval: 30,
            swing_duration: None,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            movement: MovementConfig::default(),
        }
    }
}
