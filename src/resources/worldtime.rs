use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

/// Accumulator driving the fixed (physics) schedule.
#[derive(Resource, Clone, Copy, Debug)]
pub struct FixedTimestep {
    /// Seconds per fixed tick.
    pub step: f32,
    pub accumulator: f32,
    /// Upper bound of fixed ticks run in a single frame.
    pub max_steps_per_frame: u32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(1.0 / 50.0)
    }
}

impl FixedTimestep {
    pub fn new(step: f32) -> Self {
        FixedTimestep {
            step: step.max(1e-4),
            accumulator: 0.0,
            max_steps_per_frame: 8,
        }
    }
}
