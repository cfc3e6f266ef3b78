#[derive(Debug, Clone, PartialEq)]
pub struct MovementConfig {
    pub default_speed: f32,
    pub walk_floor: f32,
    pub sprint_cap: f32,

    pub speed_increase: f32,
    pub speed_decrease: f32,

    pub sprint_interval: f32,
    pub decay_interval: f32,

    /// Forward speed a sprint needs to keep ramping, and below which decay snaps to default.
    pub sustain_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            default_speed: 300.0,
            walk_floor: 300.0,
            sprint_cap: 600.0,

            speed_increase: 50.0,
            speed_decrease: 50.0,

            sprint_interval: 0.1,
            decay_interval: 0.2,

            sustain_speed: 50.0,
        }
    }
}
