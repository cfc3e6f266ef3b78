const FIRE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatingTimer {
    interval: f32,
    elapsed: f32,
}

impl RepeatingTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.elapsed += delta.max(0.0);
    }

    /// Consumes one period if due. Call repeatedly to drain every period that elapsed.
    pub fn consume_fire(&mut self) -> bool {
        if self.elapsed + FIRE_EPSILON >= self.interval {
            self.elapsed = (self.elapsed - self.interval).max(0.0);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Sprint,
    Decay,
}

/// Holds at most one armed timer. Arming a timer cancels whichever one was armed before.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimerSlot {
    active: Option<(TimerKind, RepeatingTimer)>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, interval: f32) {
        self.active = Some((kind, RepeatingTimer::new(interval)));
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn kind(&self) -> Option<TimerKind> {
        self.active.map(|(kind, _)| kind)
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn accumulate(&mut self, delta: f32) {
        if let Some((_, timer)) = &mut self.active {
            timer.accumulate(delta);
        }
    }

    /// Returns the kind of the timer that fired, if any period is due.
    pub fn consume_fire(&mut self) -> Option<TimerKind> {
        match &mut self.active {
            Some((kind, timer)) => timer.consume_fire().then_some(*kind),
            None => None,
        }
    }
}
