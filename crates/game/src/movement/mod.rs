mod config;
mod controller;
mod timer;

pub use config::MovementConfig;
pub use controller::{MovementSpeedController, SpeedEvent, SpeedPhase};
pub use timer::{RepeatingTimer, TimerKind, TimerSlot};
