use crate::error::RejectedTransition;

use super::MovementConfig;
use super::timer::{TimerKind, TimerSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedPhase {
    Idle,
    Sprinting,
    Decaying,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedEvent {
    MaxSpeedChanged(f32),
    /// The sprint ended on its own because forward speed fell off.
    SprintEnded,
}

/// Ramps max speed up while sprinting and back down afterwards, driven by a single timer slot.
#[derive(Debug, Clone)]
pub struct MovementSpeedController {
    config: MovementConfig,
    max_speed: f32,
    sprinting: bool,
    timer: TimerSlot,
}

impl Default for MovementSpeedController {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

impl MovementSpeedController {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            max_speed: config.default_speed,
            sprinting: false,
            timer: TimerSlot::new(),
            config,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    pub fn phase(&self) -> SpeedPhase {
        match self.timer.kind() {
            Some(TimerKind::Sprint) => SpeedPhase::Sprinting,
            Some(TimerKind::Decay) => SpeedPhase::Decaying,
            None => SpeedPhase::Idle,
        }
    }

    pub fn start_sprint(&mut self, forward_speed: f32) -> Result<(), RejectedTransition> {
        if !forward_speed.is_finite() || forward_speed <= 0.0 {
            return Err(RejectedTransition::NotMovingForward);
        }
        if self.sprinting {
            return Err(RejectedTransition::AlreadySprinting);
        }
        self.sprinting = true;
        self.timer.arm(TimerKind::Sprint, self.config.sprint_interval);
        Ok(())
    }

    pub fn stop_sprint(&mut self) -> Result<(), RejectedTransition> {
        if !self.sprinting {
            return Err(RejectedTransition::NotSprinting);
        }
        self.end_sprint();
        Ok(())
    }

    fn end_sprint(&mut self) {
        self.sprinting = false;
        self.timer.arm(TimerKind::Decay, self.config.decay_interval);
    }

    /// Advances the armed timer and runs every tick that came due.
    pub fn advance(&mut self, dt: f32, forward_speed: f32) -> Vec<SpeedEvent> {
        let mut events = Vec::new();
        self.timer.accumulate(dt);

        while let Some(kind) = self.timer.consume_fire() {
            match kind {
                TimerKind::Sprint => self.sprint_tick(forward_speed, &mut events),
                TimerKind::Decay => self.decay_tick(forward_speed, &mut events),
            }
        }

        events
    }

    fn sprint_tick(&mut self, forward_speed: f32, events: &mut Vec<SpeedEvent>) {
        if !forward_speed.is_finite() || forward_speed <= self.config.sustain_speed {
            self.end_sprint();
            events.push(SpeedEvent::SprintEnded);
            return;
        }

        let next = self.max_speed + self.config.speed_increase;
        if self.sprinting && self.max_speed < self.config.sprint_cap && next <= self.config.sprint_cap
        {
            self.max_speed = next;
            events.push(SpeedEvent::MaxSpeedChanged(next));
        }
    }

    fn decay_tick(&mut self, forward_speed: f32, events: &mut Vec<SpeedEvent>) {
        if self.sprinting || self.max_speed <= self.config.walk_floor {
            self.timer.cancel();
            return;
        }

        self.max_speed = (self.max_speed - self.config.speed_decrease).max(self.config.walk_floor);

        if forward_speed < self.config.sustain_speed {
            self.max_speed = self.config.default_speed;
            self.timer.cancel();
        } else if self.max_speed <= self.config.walk_floor {
            self.timer.cancel();
        }

        events.push(SpeedEvent::MaxSpeedChanged(self.max_speed));
    }

    /// Adopts the authority's values, re-arming the local timer to match the sprint flag.
    pub fn apply_authoritative(&mut self, max_speed: f32, sprinting: bool) {
        self.max_speed = max_speed;
        if sprinting != self.sprinting {
            self.sprinting = sprinting;
            if sprinting {
                self.timer.arm(TimerKind::Sprint, self.config.sprint_interval);
            } else {
                self.timer.arm(TimerKind::Decay, self.config.decay_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRINT_TICK: f32 = 0.1;
    const DECAY_TICK: f32 = 0.2;

    fn ramp(controller: &mut MovementSpeedController, ticks: usize, forward_speed: f32) {
        for _ in 0..ticks {
            controller.advance(SPRINT_TICK, forward_speed);
        }
    }

    #[test]
    fn sprint_rejected_when_not_moving_forward() {
        let mut controller = MovementSpeedController::default();
        assert_eq!(
            controller.start_sprint(0.0),
            Err(RejectedTransition::NotMovingForward)
        );
        assert_eq!(
            controller.start_sprint(-120.0),
            Err(RejectedTransition::NotMovingForward)
        );
        assert_eq!(
            controller.start_sprint(f32::NAN),
            Err(RejectedTransition::NotMovingForward)
        );
        assert!(!controller.is_sprinting());
        assert_eq!(controller.phase(), SpeedPhase::Idle);
    }

    #[test]
    fn five_sprint_ticks_add_250() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(60.0).unwrap();
        ramp(&mut controller, 5, 60.0);
        assert_eq!(controller.max_speed(), 550.0);
    }

    #[test]
    fn sprint_never_exceeds_cap() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(60.0).unwrap();
        ramp(&mut controller, 40, 60.0);
        assert_eq!(controller.max_speed(), 600.0);
        assert!(controller.is_sprinting());
    }

    #[test]
    fn sprint_ends_when_forward_speed_drops() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(60.0).unwrap();
        ramp(&mut controller, 2, 60.0);

        let events = controller.advance(SPRINT_TICK, 50.0);
        assert_eq!(events, vec![SpeedEvent::SprintEnded]);
        assert!(!controller.is_sprinting());
        assert_eq!(controller.phase(), SpeedPhase::Decaying);
        assert_eq!(controller.max_speed(), 400.0);
    }

    #[test]
    fn decay_snaps_to_default_when_slow() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(200.0).unwrap();
        ramp(&mut controller, 4, 200.0);
        controller.stop_sprint().unwrap();

        let events = controller.advance(DECAY_TICK, 0.0);
        assert_eq!(events, vec![SpeedEvent::MaxSpeedChanged(300.0)]);
        assert_eq!(controller.phase(), SpeedPhase::Idle);
    }

    #[test]
    fn decay_steps_down_to_floor_while_moving() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(400.0).unwrap();
        ramp(&mut controller, 6, 400.0);
        controller.stop_sprint().unwrap();
        assert_eq!(controller.max_speed(), 600.0);

        let mut seen = Vec::new();
        for _ in 0..10 {
            controller.advance(DECAY_TICK, 400.0);
            seen.push(controller.max_speed());
        }

        assert_eq!(&seen[..6], &[550.0, 500.0, 450.0, 400.0, 350.0, 300.0]);
        assert!(seen.iter().all(|&s| s >= 300.0));
        assert_eq!(controller.phase(), SpeedPhase::Idle);
    }

    #[test]
    fn sprint_and_decay_are_mutually_exclusive() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(100.0).unwrap();
        ramp(&mut controller, 3, 100.0);
        controller.stop_sprint().unwrap();
        assert_eq!(controller.phase(), SpeedPhase::Decaying);

        controller.start_sprint(100.0).unwrap();
        assert_eq!(controller.phase(), SpeedPhase::Sprinting);

        // Decay interval elapsed, but only the sprint timer is armed.
        let events = controller.advance(DECAY_TICK, 100.0);
        assert!(
            events
                .iter()
                .all(|e| matches!(e, SpeedEvent::MaxSpeedChanged(s) if *s > 450.0))
        );
        assert_eq!(controller.max_speed(), 550.0);
    }

    #[test]
    fn stop_without_sprint_is_rejected() {
        let mut controller = MovementSpeedController::default();
        assert_eq!(
            controller.stop_sprint(),
            Err(RejectedTransition::NotSprinting)
        );
        assert_eq!(controller.phase(), SpeedPhase::Idle);
    }

    #[test]
    fn authoritative_values_win() {
        let mut controller = MovementSpeedController::default();
        controller.start_sprint(100.0).unwrap();
        ramp(&mut controller, 3, 100.0);

        controller.apply_authoritative(350.0, false);
        assert_eq!(controller.max_speed(), 350.0);
        assert!(!controller.is_sprinting());
        assert_eq!(controller.phase(), SpeedPhase::Decaying);
    }
}
