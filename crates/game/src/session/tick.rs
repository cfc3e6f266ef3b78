/// Fixed-rate tick accumulator. Long frames are clamped so a stall cannot trigger a burst of ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_frame: f32,
}

impl FixedTimestep {
    pub const DEFAULT_MAX_FRAME: f32 = 0.25;

    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
            max_frame: Self::DEFAULT_MAX_FRAME,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, self.max_frame);
    }

    pub fn consume_tick(&mut self) -> bool {
        // Tolerate rounding so that accumulating exactly dt always yields one tick.
        if self.accumulator + self.dt * 1e-4 >= self.dt {
            self.accumulator = (self.accumulator - self.dt).max(0.0);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(1.0 / 30.0);
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut ts = FixedTimestep::new(10);
        ts.accumulate(5.0);

        let mut ticks = 0;
        while ts.consume_tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 2);
    }
}
