//! Per-frame driver for [`MovingPlatform`] components.
//!
//! Each run of [`moving_platform_system`]:
//!
//! 1. Initializes platforms seen for the first time and auto-starts them.
//! 2. Applies every queued [`PlatformCommand`].
//! 3. Updates each platform's strategy (re-probe, then tween advance).
//!
//! Strategies only see a [`MovementContext`]; this module is where that
//! context is assembled from ECS state.

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use bevy_ecs::system::{SystemParam, SystemState};
use glam::Vec2;
use log::{error, warn};
use smallvec::SmallVec;

use crate::components::boxcollider::BoxCollider;
use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::mapposition::MapPosition;
use crate::components::movingplatform::MovingPlatform;
use crate::error::PlatformError;
use crate::movement::obstacle::Footprint;
use crate::movement::{MovementContext, WorldState};
use crate::resources::collisionworld::ColliderWorld;
use crate::resources::eventbus::EventBus;
use crate::resources::levelrotation::{LevelRotation, WorldGravity};
use crate::resources::platformcommands::{PlatformAction, PlatformCommand, PlatformCommandQueue};
use crate::resources::worldtime::WorldTime;

type PlatformItem = (
    Entity,
    &'static mut MovingPlatform,
    &'static mut MapPosition,
    Option<&'static ChildOf>,
    Option<&'static BoxCollider>,
);

/// Queries and resources needed to build a [`MovementContext`].
#[derive(SystemParam)]
pub struct PlatformAccess<'w, 's> {
    pub platforms: Query<'w, 's, PlatformItem>,
    pub transforms: Query<'w, 's, &'static GlobalTransform2D>,
    pub bus: ResMut<'w, EventBus>,
    pub colliders: Res<'w, ColliderWorld>,
    pub rotation: Res<'w, LevelRotation>,
    pub gravity: Res<'w, WorldGravity>,
    pub time: Res<'w, WorldTime>,
}

impl PlatformAccess<'_, '_> {
    pub fn world_state(&self) -> WorldState {
        WorldState {
            in_rotation: self.rotation.is_rotating(),
            gravity: self.gravity.0,
        }
    }

    /// Run `f` with `platform`'s component and a fresh context. Returns
    /// `None` if the entity has no [`MovingPlatform`].
    pub fn with_context<R>(
        &mut self,
        platform: Entity,
        f: impl FnOnce(&mut MovingPlatform, &mut MovementContext) -> R,
    ) -> Option<R> {
        let world = self.world_state();
        let transforms = &self.transforms;
        let Ok((_, mut moving_platform, mut position, child_of, collider)) =
            self.platforms.get_mut(platform)
        else {
            return None;
        };

        let frame = child_of
            .and_then(|link| transforms.get(link.parent()).ok())
            .copied()
            .unwrap_or(GlobalTransform2D::IDENTITY);
        let footprint = collider.map(|collider| {
            let own = transforms
                .get(platform)
                .copied()
                .unwrap_or_else(|_| frame.compose(position.pos, 0.0, Vec2::ONE));
            let (min, max) = collider.world_bounds(&own);
            Footprint {
                center_offset: (min + max) * 0.5 - own.position,
                size: max - min,
            }
        });
        let anchors = |entity: Entity| transforms.get(entity).ok().map(|gt| gt.position);

        let mut ctx = MovementContext {
            platform,
            now: self.time.elapsed,
            delta: self.time.delta,
            world,
            frame,
            local_position: &mut position.pos,
            waypoints: SmallVec::new(),
            markers: SmallVec::new(),
            footprint,
            physics: &*self.colliders,
            anchors: &anchors,
            bus: &mut self.bus,
        };
        Some(f(&mut *moving_platform, &mut ctx))
    }
}

fn apply_action(
    platform: &mut MovingPlatform,
    ctx: &mut MovementContext,
    action: PlatformAction,
) -> Result<(), PlatformError> {
    match action {
        PlatformAction::Start => platform.start_movement(ctx),
        PlatformAction::Stop => {
            platform.stop_movement(ctx);
            Ok(())
        }
        PlatformAction::Pause => {
            platform.pause_movement(ctx);
            Ok(())
        }
        PlatformAction::Resume => {
            platform.resume_movement(ctx);
            Ok(())
        }
        PlatformAction::Trigger => platform.trigger_movement(ctx),
        PlatformAction::Reset => platform.reset_platform(ctx),
        PlatformAction::SetWaypoints(waypoints) => platform.set_waypoints(ctx, waypoints),
        PlatformAction::UpdateConfig(config) => platform.update_config(ctx, config),
    }
}

fn initialize_platform(platform: &mut MovingPlatform, ctx: &mut MovementContext) {
    if let Err(e) = platform.initialize(ctx) {
        error!("Platform {:?} failed to initialize: {}", ctx.platform, e);
        return;
    }
    if platform.auto_start
        && let Err(e) = platform.start_movement(ctx)
    {
        error!("Platform {:?} failed to start: {}", ctx.platform, e);
    }
}

pub fn moving_platform_system(
    mut queue: ResMut<PlatformCommandQueue>,
    mut access: PlatformAccess,
) {
    let entities: Vec<Entity> = access.platforms.iter().map(|(entity, ..)| entity).collect();
    for &entity in &entities {
        access.with_context(entity, |platform, ctx| {
            if platform.needs_initialization() {
                initialize_platform(platform, ctx);
            }
        });
    }

    for PlatformCommand { platform, action } in queue.drain() {
        let applied = access.with_context(platform, |moving_platform, ctx| {
            apply_action(moving_platform, ctx, action)
        });
        match applied {
            None => warn!("Platform command for {:?} which is not a platform", platform),
            Some(Err(e)) => warn!("Platform command for {:?} failed: {}", platform, e),
            Some(Ok(())) => {}
        }
    }

    for entity in entities {
        access.with_context(entity, |platform, ctx| platform.update(ctx));
    }
}

/// Run `f` against `platform` outside of a schedule.
///
/// Returns `None` when the entity is not a platform or the platform
/// resources have not been set up.
pub fn with_platform_context<R>(
    world: &mut World,
    platform: Entity,
    f: impl FnOnce(&mut MovingPlatform, &mut MovementContext) -> R,
) -> Option<R> {
    if !(world.contains_resource::<EventBus>()
        && world.contains_resource::<ColliderWorld>()
        && world.contains_resource::<LevelRotation>()
        && world.contains_resource::<WorldGravity>()
        && world.contains_resource::<WorldTime>())
    {
        warn!("Platform resources missing, call setup_world first");
        return None;
    }
    let mut state = SystemState::<PlatformAccess>::new(world);
    let mut access = state.get_mut(world);
    access.with_context(platform, f)
}
