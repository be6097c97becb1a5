//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per frame, applying `time_scale` to the provided delta.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::{FixedTimestep, WorldTime};

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is the unscaled frame delta in seconds. Negative deltas count as
/// zero.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt.max(0.0) * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Add the scaled frame delta to the fixed accumulator and return how many
/// fixed ticks to run now. Ticks beyond `max_steps_per_frame` are dropped.
pub fn consume_fixed_steps(world: &mut World) -> u32 {
    let delta = world.resource::<WorldTime>().delta;
    let mut fixed = world.resource_mut::<FixedTimestep>();
    fixed.accumulator += delta;
    let mut steps = 0;
    while fixed.accumulator >= fixed.step && steps < fixed.max_steps_per_frame {
        fixed.accumulator -= fixed.step;
        steps += 1;
    }
    if steps == fixed.max_steps_per_frame && fixed.accumulator >= fixed.step {
        fixed.accumulator %= fixed.step;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_applies() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            time_scale: 0.5,
            ..Default::default()
        });
        update_world_time(&mut world, 0.2);
        let wt = world.resource::<WorldTime>();
        assert!((wt.delta - 0.1).abs() < 1e-6);
        assert!((wt.elapsed - 0.1).abs() < 1e-6);
        assert_eq!(wt.frame_count, 1);
    }

    #[test]
    fn test_fixed_steps_accumulate() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(FixedTimestep::new(0.02));
        update_world_time(&mut world, 0.05);
        assert_eq!(consume_fixed_steps(&mut world), 2);
        update_world_time(&mut world, 0.015);
        assert_eq!(consume_fixed_steps(&mut world), 1);
    }

    #[test]
    fn test_fixed_steps_are_capped() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(FixedTimestep::new(0.01));
        update_world_time(&mut world, 1.0);
        assert_eq!(consume_fixed_steps(&mut world), 8);
        assert!(world.resource::<FixedTimestep>().accumulator < 0.01);
    }
}
