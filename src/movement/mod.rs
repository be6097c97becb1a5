//! Movement strategies for moving platforms.
//!
//! A [`MovingPlatform`](crate::components::movingplatform::MovingPlatform)
//! owns exactly one [`MovementStrategy`]. Every strategy call receives a
//! [`MovementContext`] assembled by the platform system: the platform's
//! local position to write to, its parent frame, resolved waypoints, the
//! world state (rotation flag and gravity), a physics query and the event
//! bus. Strategies never reach into the ECS world themselves.
//!
//! Submodules:
//! - [`loop_movement`] – endless travel along the waypoint path
//! - [`trigger_movement`] – one move per activation, with cooldown
//! - [`gravity_movement`] – slides between two waypoints following gravity
//! - [`obstacle`] – footprint sweep used to block gravity moves
//!
//! Tweens run in the platform's parent space so a platform parented under a
//! rotating level keeps following its level-relative path.

pub mod gravity_movement;
pub mod loop_movement;
pub mod obstacle;
pub mod trigger_movement;

use bevy_ecs::entity::Entity;
use glam::Vec2;
use smallvec::SmallVec;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::platformconfig::{MovementKind, PlatformConfig};
use crate::error::PlatformError;
use crate::events::platform::{EventKind, EventPayload};
use crate::resources::eventbus::EventBus;

use gravity_movement::GravityMovement;
use loop_movement::LoopMovement;
use obstacle::{Footprint, ObstacleDetector, PhysicsQuery};
use trigger_movement::TriggerMovement;

/// Global state the strategies react to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldState {
    /// The level is being rotated; tweens hold still.
    pub in_rotation: bool,
    /// Unit world gravity, fixed in world space.
    pub gravity: Vec2,
}

impl Default for WorldState {
    fn default() -> Self {
        WorldState {
            in_rotation: false,
            gravity: Vec2::NEG_Y,
        }
    }
}

/// Everything a strategy may read or write during one call.
pub struct MovementContext<'a> {
    pub platform: Entity,
    /// Seconds since startup.
    pub now: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    pub world: WorldState,
    /// World transform of the platform's parent (identity for roots).
    pub frame: GlobalTransform2D,
    /// Platform position in parent space.
    pub local_position: &'a mut Vec2,
    /// Resolved world-space waypoints.
    pub waypoints: SmallVec<[Vec2; 4]>,
    /// Entities whose colliders never block this platform.
    pub markers: SmallVec<[Entity; 4]>,
    pub footprint: Option<Footprint>,
    pub physics: &'a dyn PhysicsQuery,
    /// World position lookup for waypoint anchors.
    pub anchors: &'a dyn Fn(Entity) -> Option<Vec2>,
    pub bus: &'a mut EventBus,
}

impl MovementContext<'_> {
    pub fn world_position(&self) -> Vec2 {
        self.frame.transform_point(*self.local_position)
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        self.frame.inverse_transform_point(world)
    }

    /// Waypoints converted to the platform's parent space.
    pub fn local_waypoints(&self) -> SmallVec<[Vec2; 4]> {
        self.waypoints.iter().map(|&w| self.to_local(w)).collect()
    }

    pub fn obstacle_detector(&self, layer_mask: u32) -> ObstacleDetector<'_> {
        ObstacleDetector {
            physics: self.physics,
            platform: self.platform,
            markers: self.markers.as_slice(),
            layer_mask,
        }
    }

    /// Publish `kind` with this platform as payload.
    pub fn publish(&mut self, kind: EventKind) {
        self.bus
            .publish(kind, Some(EventPayload::Platform(self.platform)));
    }
}

/// Contract shared by every movement strategy.
pub trait MovementBehavior {
    /// Called once before the first start, and again after a strategy swap.
    fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError>;
    fn start(&mut self, ctx: &mut MovementContext);
    /// Kill any tween and pending wait. Publishes stop if a tween was alive.
    fn stop(&mut self, ctx: &mut MovementContext);
    fn pause(&mut self, ctx: &mut MovementContext);
    fn resume(&mut self, ctx: &mut MovementContext);
    fn on_trigger_activated(&mut self, ctx: &mut MovementContext);
    /// Advance one frame.
    fn update(&mut self, ctx: &mut MovementContext);
    fn is_moving(&self) -> bool;
    /// Reset cursors after the orchestrator snapped the platform back.
    fn reset(&mut self, ctx: &mut MovementContext);
    /// Release everything the strategy holds. Does not publish.
    fn on_destroy(&mut self, bus: &mut EventBus);
    /// Apply a config of the same kind in place.
    fn configure(&mut self, config: &PlatformConfig);
}

/// The active strategy of a platform.
#[derive(Debug)]
pub enum MovementStrategy {
    Loop(LoopMovement),
    Trigger(TriggerMovement),
    Gravity(GravityMovement),
}

impl MovementStrategy {
    pub fn new(config: &PlatformConfig) -> Self {
        match config.movement_kind {
            MovementKind::Loop => MovementStrategy::Loop(LoopMovement::new(config.clone())),
            MovementKind::Trigger => {
                MovementStrategy::Trigger(TriggerMovement::new(config.clone()))
            }
            MovementKind::Gravity => {
                MovementStrategy::Gravity(GravityMovement::new(config.clone()))
            }
        }
    }

    pub fn kind(&self) -> MovementKind {
        match self {
            MovementStrategy::Loop(_) => MovementKind::Loop,
            MovementStrategy::Trigger(_) => MovementKind::Trigger,
            MovementStrategy::Gravity(_) => MovementKind::Gravity,
        }
    }

    pub fn as_gravity(&self) -> Option<&GravityMovement> {
        match self {
            MovementStrategy::Gravity(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_gravity_mut(&mut self) -> Option<&mut GravityMovement> {
        match self {
            MovementStrategy::Gravity(g) => Some(g),
            _ => None,
        }
    }

    fn behavior(&self) -> &dyn MovementBehavior {
        match self {
            MovementStrategy::Loop(s) => s,
            MovementStrategy::Trigger(s) => s,
            MovementStrategy::Gravity(s) => s,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn MovementBehavior {
        match self {
            MovementStrategy::Loop(s) => s,
            MovementStrategy::Trigger(s) => s,
            MovementStrategy::Gravity(s) => s,
        }
    }
}

impl MovementBehavior for MovementStrategy {
    fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        self.behavior_mut().initialize(ctx)
    }

    fn start(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().start(ctx)
    }

    fn stop(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().stop(ctx)
    }

    fn pause(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().pause(ctx)
    }

    fn resume(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().resume(ctx)
    }

    fn on_trigger_activated(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().on_trigger_activated(ctx)
    }

    fn update(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().update(ctx)
    }

    fn is_moving(&self) -> bool {
        self.behavior().is_moving()
    }

    fn reset(&mut self, ctx: &mut MovementContext) {
        self.behavior_mut().reset(ctx)
    }

    fn on_destroy(&mut self, bus: &mut EventBus) {
        self.behavior_mut().on_destroy(bus)
    }

    fn configure(&mut self, config: &PlatformConfig) {
        self.behavior_mut().configure(config)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal harness for driving a strategy without an ECS world.

    use super::*;
    use crate::movement::obstacle::CastHit;

    /// Physics that reports a fixed list of hits for every cast.
    #[derive(Default)]
    pub struct FakePhysics {
        pub hits: Vec<CastHit>,
    }

    impl PhysicsQuery for FakePhysics {
        fn box_cast_all(&self, _: Vec2, _: Vec2, _: Vec2, _: f32, _: u32) -> Vec<CastHit> {
            self.hits.clone()
        }
        fn is_descendant_of(&self, _: Entity, _: Entity) -> bool {
            false
        }
        fn is_rider_detector(&self, _: Entity) -> bool {
            false
        }
    }

    pub fn no_anchor(_: Entity) -> Option<Vec2> {
        None
    }

    pub struct Harness {
        pub platform: Entity,
        pub position: Vec2,
        pub waypoints: Vec<Vec2>,
        pub world: WorldState,
        pub now: f32,
        pub physics: FakePhysics,
        pub bus: EventBus,
        pub footprint: Option<Footprint>,
    }

    impl Harness {
        pub fn new(position: Vec2, waypoints: &[Vec2]) -> Self {
            let mut world = bevy_ecs::world::World::new();
            Harness {
                platform: world.spawn_empty().id(),
                position,
                waypoints: waypoints.to_vec(),
                world: WorldState::default(),
                now: 0.0,
                physics: FakePhysics::default(),
                bus: EventBus::new(),
                footprint: Some(Footprint {
                    center_offset: Vec2::ZERO,
                    size: Vec2::ONE,
                }),
            }
        }

        /// Run `f` with a context for a frame of length `delta`.
        pub fn with_ctx<R>(
            &mut self,
            delta: f32,
            f: impl FnOnce(&mut MovementContext) -> R,
        ) -> R {
            let mut ctx = MovementContext {
                platform: self.platform,
                now: self.now,
                delta,
                world: self.world,
                frame: GlobalTransform2D::IDENTITY,
                local_position: &mut self.position,
                waypoints: self.waypoints.iter().copied().collect(),
                markers: SmallVec::new(),
                footprint: self.footprint,
                physics: &self.physics,
                anchors: &no_anchor,
                bus: &mut self.bus,
            };
            f(&mut ctx)
        }

        /// Advance the clock by `dt` and run one update.
        pub fn step<S: MovementBehavior>(&mut self, strategy: &mut S, dt: f32) {
            self.now += dt;
            self.with_ctx(dt, |ctx| strategy.update(ctx));
        }
    }
}
