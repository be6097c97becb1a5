//! World setup, schedules and the frame driver.
//!
//! The host owns a [`World`] and two schedules:
//!
//! - the frame schedule from [`build_update_schedule`], run once per frame:
//!   transforms, collider snapshot, trigger cooldowns, platforms, transforms;
//! - the fixed schedule from [`build_fixed_schedule`], run zero or more times
//!   per frame from the [`FixedTimestep`] accumulator: rider detection, rider
//!   carry, transforms.
//!
//! [`run_frame`] advances time and runs both in that order.

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, info, warn};

use crate::components::boxcollider::BoxCollider;
use crate::components::mapposition::MapPosition;
use crate::components::movingplatform::MovingPlatform;
use crate::components::platformcontroller::{DEFAULT_CARRY_THRESHOLD, PlatformController};
use crate::components::riderdetector::RiderDetector;
use crate::events::platformtrigger::observe_platform_trigger;
use crate::resources::collisionworld::ColliderWorld;
use crate::resources::eventbus::{EventBus, init_event_bus, shutdown_event_bus};
use crate::resources::levelrotation::{LevelRotation, WorldGravity};
use crate::resources::platformcommands::PlatformCommandQueue;
use crate::resources::platformsettings::PlatformSettings;
use crate::resources::worldtime::{FixedTimestep, WorldTime};
use crate::systems::collisionworld::rebuild_collider_world;
use crate::systems::movingplatform::moving_platform_system;
use crate::systems::platformcontroller::carry_riders;
use crate::systems::platformtrigger::platform_trigger_cooldown_system;
use crate::systems::propagate_transforms::propagate_transforms;
use crate::systems::riderdetector::rider_detection_system;
use crate::systems::time::{consume_fixed_steps, update_world_time};

/// Height of the rider sensor strip above a platform.
pub const DETECTOR_HEIGHT: f32 = 0.2;

/// Insert every resource and observer the platform systems need.
pub fn setup_world(world: &mut World, settings: PlatformSettings) {
    world.insert_resource(WorldTime::default());
    world.insert_resource(FixedTimestep::new(settings.fixed_timestep));
    world.insert_resource(LevelRotation::default());
    world.insert_resource(WorldGravity(settings.gravity));
    world.insert_resource(ColliderWorld::default());
    world.insert_resource(PlatformCommandQueue::default());
    init_event_bus(world);
    world.spawn(Observer::new(observe_platform_trigger));
    world.insert_resource(settings);
    // observers must be registered before the first trigger
    world.flush();
}

/// Destroy every platform, then drop the event bus.
pub fn teardown(world: &mut World) {
    let platforms: Vec<Entity> = world
        .query_filtered::<Entity, With<MovingPlatform>>()
        .iter(world)
        .collect();
    for platform in platforms {
        despawn_moving_platform(world, platform);
    }
    shutdown_event_bus(world);
    info!("Platform world torn down");
}

pub fn build_update_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            propagate_transforms,
            rebuild_collider_world,
            platform_trigger_cooldown_system,
            moving_platform_system,
            propagate_transforms,
        )
            .chain(),
    );
    update
}

pub fn build_fixed_schedule() -> Schedule {
    let mut fixed = Schedule::default();
    fixed.add_systems((rider_detection_system, carry_riders, propagate_transforms).chain());
    fixed
}

/// Advance time by `dt`, run the frame schedule, then as many fixed ticks
/// as the accumulator allows. Returns the number of fixed ticks run.
pub fn run_frame(world: &mut World, update: &mut Schedule, fixed: &mut Schedule, dt: f32) -> u32 {
    update_world_time(world, dt);
    update.run(world);
    let steps = consume_fixed_steps(world);
    for _ in 0..steps {
        fixed.run(world);
    }
    world.clear_trackers();
    steps
}

/// Spawn a platform with a centered box collider of `size` at `position`
/// and a rider sensor strip on top of it.
pub fn spawn_moving_platform(
    world: &mut World,
    platform: MovingPlatform,
    position: Vec2,
    size: Vec2,
) -> Entity {
    let carry_threshold = world
        .get_resource::<PlatformSettings>()
        .map(|s| s.carry_threshold)
        .unwrap_or(DEFAULT_CARRY_THRESHOLD);
    let kind = platform.kind();
    let entity = world
        .spawn((
            platform,
            MapPosition::from_vec(position),
            BoxCollider::centered(size.x, size.y),
            PlatformController::new(carry_threshold),
        ))
        .id();
    world.spawn((
        RiderDetector::new(entity),
        MapPosition::new(0.0, (size.y + DETECTOR_HEIGHT) * 0.5),
        BoxCollider::centered(size.x, DETECTOR_HEIGHT),
        ChildOf(entity),
    ));
    debug!("Spawned {:?} platform {:?} at {:?}", kind, entity, position);
    entity
}

/// Release a platform's subscriptions and riders, then despawn it with its
/// children. Returns false if `entity` does not exist.
pub fn despawn_moving_platform(world: &mut World, entity: Entity) -> bool {
    if world.get_entity(entity).is_err() {
        return false;
    }
    if world.contains_resource::<EventBus>() {
        world.resource_scope(|world, mut bus: Mut<EventBus>| {
            if let Some(mut platform) = world.get_mut::<MovingPlatform>(entity) {
                platform.destroy(&mut bus);
            }
            bus.unsubscribe_owner(entity);
        });
    } else {
        warn!("Despawning platform {:?} without an event bus", entity);
    }
    if let Some(mut controller) = world.get_mut::<PlatformController>(entity) {
        controller.clear();
    }
    world.despawn(entity)
}
