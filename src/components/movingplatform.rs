//! Moving platform orchestrator.
//!
//! [`MovingPlatform`] owns a platform's [`PlatformConfig`], its
//! [`WaypointSource`] and the active [`MovementStrategy`]. Every public
//! operation validates what it needs, refreshes the context waypoints from
//! the source and delegates to the strategy.
//!
//! The component is driven by
//! [`moving_platform_system`](crate::systems::movingplatform::moving_platform_system),
//! which initializes it on its first frame, applies queued
//! [`PlatformCommand`](crate::resources::platformcommands::PlatformCommand)s
//! and advances the strategy. Outside of that system use
//! [`with_platform_context`](crate::systems::movingplatform::with_platform_context).
//!
//! # Example
//!
//! ```ignore
//! let config = PlatformConfig::of_kind(MovementKind::Trigger).with_speed(3.0);
//! let waypoints = WaypointSource::Points(vec![Vec2::ZERO, Vec2::new(0.0, 4.0)]);
//! let platform = spawn_moving_platform(world, MovingPlatform::new(config, waypoints), ...);
//! world.resource_mut::<PlatformCommandQueue>().push(platform, PlatformAction::Trigger);
//! ```

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, warn};

use super::mapposition::MapPosition;
use super::platformconfig::{MovementKind, PlatformConfig};
use super::platformcontroller::PlatformController;
use super::waypoint::WaypointSource;
use crate::error::PlatformError;
use crate::events::platform::{EventKind, EventPayload};
use crate::movement::gravity_movement::GravityMovement;
use crate::movement::{MovementBehavior, MovementContext, MovementStrategy, WorldState};
use crate::resources::eventbus::EventBus;

#[derive(Component, Debug)]
#[require(MapPosition, PlatformController)]
pub struct MovingPlatform {
    config: PlatformConfig,
    waypoints: WaypointSource,
    strategy: MovementStrategy,
    /// Start moving right after initialization.
    pub auto_start: bool,
    initialized: bool,
    /// Last initialization failure; cleared when config or waypoints change.
    init_error: Option<PlatformError>,
}

impl MovingPlatform {
    pub fn new(config: PlatformConfig, waypoints: WaypointSource) -> Self {
        let strategy = MovementStrategy::new(&config);
        MovingPlatform {
            config,
            waypoints,
            strategy,
            auto_start: true,
            initialized: false,
            init_error: None,
        }
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn waypoint_source(&self) -> &WaypointSource {
        &self.waypoints
    }

    pub fn strategy(&self) -> &MovementStrategy {
        &self.strategy
    }

    pub fn kind(&self) -> MovementKind {
        self.strategy.kind()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn init_error(&self) -> Option<&PlatformError> {
        self.init_error.as_ref()
    }

    /// Initialization pending and not known to fail.
    pub fn needs_initialization(&self) -> bool {
        !self.initialized && self.init_error.is_none()
    }

    pub fn is_moving(&self) -> bool {
        self.strategy.is_moving()
    }

    /// Resolve the waypoint source into `ctx`.
    fn sync_waypoints(&self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        ctx.waypoints = self.waypoints.resolve(ctx.anchors)?;
        ctx.markers = self.waypoints.markers();
        Ok(())
    }

    /// Validate and initialize the strategy. Failures are remembered so the
    /// platform system does not retry every frame.
    pub fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        let result = self
            .config
            .validate()
            .and_then(|_| self.sync_waypoints(ctx))
            .and_then(|_| self.strategy.initialize(ctx));
        match result {
            Ok(()) => {
                self.initialized = true;
                self.init_error = None;
                debug!(
                    "Platform {:?} initialized as {:?} with {} waypoints",
                    ctx.platform,
                    self.kind(),
                    ctx.waypoints.len()
                );
                Ok(())
            }
            Err(e) => {
                self.initialized = false;
                self.init_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn ensure_ready(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        if self.initialized {
            self.sync_waypoints(ctx)
        } else {
            self.initialize(ctx)
        }
    }

    pub fn start_movement(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        self.config.validate()?;
        self.ensure_ready(ctx)?;
        self.strategy.start(ctx);
        Ok(())
    }

    pub fn stop_movement(&mut self, ctx: &mut MovementContext) {
        self.strategy.stop(ctx);
    }

    pub fn pause_movement(&mut self, ctx: &mut MovementContext) {
        self.strategy.pause(ctx);
    }

    pub fn resume_movement(&mut self, ctx: &mut MovementContext) {
        self.strategy.resume(ctx);
    }

    /// Ask a Trigger platform to move. The request goes out on the bus and
    /// is picked up by the strategy's next update.
    pub fn trigger_movement(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        if self.kind() != MovementKind::Trigger {
            warn!(
                "Platform {:?} is a {:?} platform and cannot be triggered",
                ctx.platform,
                self.kind()
            );
            return Err(PlatformError::WrongKind {
                expected: MovementKind::Trigger,
                actual: self.kind(),
            });
        }
        self.ensure_ready(ctx)?;
        ctx.bus.publish(
            EventKind::PlatformTrigger,
            Some(EventPayload::Platform(ctx.platform)),
        );
        Ok(())
    }

    /// Stop, snap back to the first waypoint and reset strategy cursors.
    pub fn reset_platform(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        self.ensure_ready(ctx)?;
        self.strategy.stop(ctx);
        *ctx.local_position = ctx.to_local(ctx.waypoints[0]);
        self.strategy.reset(ctx);
        Ok(())
    }

    pub fn set_waypoints(
        &mut self,
        ctx: &mut MovementContext,
        waypoints: WaypointSource,
    ) -> Result<(), PlatformError> {
        if waypoints.len() < 2 {
            return Err(PlatformError::NotEnoughWaypoints(waypoints.len()));
        }
        let was_moving = self.is_moving();
        if was_moving {
            self.strategy.stop(ctx);
        }
        self.waypoints = waypoints;
        self.init_error = None;
        if was_moving {
            self.start_movement(ctx)?;
        }
        Ok(())
    }

    /// Swap the config. A different movement kind rebuilds the strategy.
    pub fn update_config(
        &mut self,
        ctx: &mut MovementContext,
        config: PlatformConfig,
    ) -> Result<(), PlatformError> {
        config.validate()?;
        let was_moving = self.is_moving();
        if config.movement_kind != self.kind() {
            // the replacement must accept the current waypoints before the
            // old strategy is torn down
            let mut next = MovementStrategy::new(&config);
            if self.initialized {
                self.sync_waypoints(ctx)?;
                next.initialize(ctx)?;
            }
            self.strategy.stop(ctx);
            self.strategy.on_destroy(ctx.bus);
            self.strategy = next;
            self.config = config;
            self.init_error = None;
            debug!(
                "Platform {:?} switched to {:?}",
                ctx.platform,
                self.kind()
            );
        } else {
            if was_moving {
                self.strategy.stop(ctx);
            }
            self.strategy.configure(&config);
            self.config = config;
            self.init_error = None;
        }
        if was_moving {
            self.start_movement(ctx)?;
        }
        Ok(())
    }

    /// Advance one frame. Does nothing before initialization.
    pub fn update(&mut self, ctx: &mut MovementContext) {
        if !self.initialized {
            return;
        }
        if let Err(e) = self.sync_waypoints(ctx) {
            if self.strategy.is_moving() {
                warn!("Platform {:?} lost its waypoints: {}", ctx.platform, e);
                self.strategy.stop(ctx);
            }
            return;
        }
        self.strategy.update(ctx);
    }

    /// Tear down the strategy. Called before the entity goes away.
    pub fn destroy(&mut self, bus: &mut EventBus) {
        self.strategy.on_destroy(bus);
        self.initialized = false;
    }

    fn gravity(&self) -> Result<&GravityMovement, PlatformError> {
        self.strategy.as_gravity().ok_or(PlatformError::WrongKind {
            expected: MovementKind::Gravity,
            actual: self.kind(),
        })
    }

    pub fn can_move_with_gravity(
        &self,
        ctx: &mut MovementContext,
    ) -> Result<bool, PlatformError> {
        let gravity = self.gravity()?;
        self.sync_waypoints(ctx)?;
        Ok(gravity.can_move_now(ctx))
    }

    pub fn gravity_direction(&self, world: &WorldState) -> Result<Vec2, PlatformError> {
        Ok(self.gravity()?.gravity_direction(world))
    }

    pub fn next_move_direction(&self, ctx: &mut MovementContext) -> Result<Vec2, PlatformError> {
        let gravity = self.gravity()?;
        self.sync_waypoints(ctx)?;
        Ok(gravity.next_move_direction(ctx))
    }

    pub fn force_move_to(
        &mut self,
        ctx: &mut MovementContext,
        index: usize,
    ) -> Result<(), PlatformError> {
        self.gravity()?;
        self.ensure_ready(ctx)?;
        match self.strategy.as_gravity_mut() {
            Some(g) => g.force_move_to(ctx, index),
            None => Err(PlatformError::NotInitialized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::test_support::Harness;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn points(p: &[Vec2]) -> WaypointSource {
        WaypointSource::Points(p.to_vec())
    }

    #[test]
    fn test_start_with_one_waypoint_stays_idle() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp = MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO]));
        let result = h.with_ctx(0.0, |ctx| mp.start_movement(ctx));
        assert_eq!(result, Err(PlatformError::NotEnoughWaypoints(1)));
        assert!(!mp.is_moving());
        assert!(!mp.is_initialized());
    }

    #[test]
    fn test_start_with_bad_speed_fails() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let config = PlatformConfig::default().with_speed(-1.0);
        let mut mp = MovingPlatform::new(config, points(&[Vec2::ZERO, Vec2::ONE]));
        let result = h.with_ctx(0.0, |ctx| mp.start_movement(ctx));
        assert!(matches!(result, Err(PlatformError::InvalidSpeed(_))));
        assert!(!mp.is_moving());
    }

    #[test]
    fn test_trigger_on_loop_platform_is_rejected() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp =
            MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO, Vec2::ONE]));
        let result = h.with_ctx(0.0, |ctx| mp.trigger_movement(ctx));
        assert_eq!(
            result,
            Err(PlatformError::WrongKind {
                expected: MovementKind::Trigger,
                actual: MovementKind::Loop
            })
        );
        assert!(!mp.is_moving());
    }

    #[test]
    fn test_trigger_goes_through_bus() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let config = PlatformConfig::of_kind(MovementKind::Trigger);
        let mut mp = MovingPlatform::new(config, points(&[Vec2::ZERO, Vec2::new(0.0, 2.0)]));
        h.with_ctx(0.0, |ctx| mp.trigger_movement(ctx)).unwrap();
        assert!(!mp.is_moving());
        h.with_ctx(0.1, |ctx| mp.update(ctx));
        assert!(mp.is_moving());
    }

    #[test]
    fn test_reset_snaps_to_first_waypoint() {
        let mut h = Harness::new(Vec2::new(3.0, 3.0), &[]);
        let mut mp = MovingPlatform::new(
            PlatformConfig::default(),
            points(&[Vec2::new(1.0, 0.0), Vec2::new(5.0, 0.0)]),
        );
        h.with_ctx(0.0, |ctx| mp.start_movement(ctx)).unwrap();
        assert!(mp.is_moving());
        h.with_ctx(0.0, |ctx| mp.reset_platform(ctx)).unwrap();
        assert!(!mp.is_moving());
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_update_config_switches_strategy_and_restarts() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp =
            MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO, Vec2::new(0.0, -4.0)]));
        h.with_ctx(0.0, |ctx| mp.start_movement(ctx)).unwrap();
        assert!(mp.is_moving());

        let gravity = PlatformConfig::of_kind(MovementKind::Gravity);
        h.with_ctx(0.0, |ctx| mp.update_config(ctx, gravity)).unwrap();
        assert_eq!(mp.kind(), MovementKind::Gravity);
        assert!(mp.is_initialized());
        // gravity start polls at once and heads down
        assert!(mp.is_moving());

        let faster = PlatformConfig::of_kind(MovementKind::Gravity).with_speed(8.0);
        h.with_ctx(0.0, |ctx| mp.update_config(ctx, faster)).unwrap();
        assert_eq!(mp.config().move_speed, 8.0);
    }

    #[test]
    fn test_update_config_rejects_bad_speed_without_change() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp =
            MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO, Vec2::ONE]));
        let bad = PlatformConfig::of_kind(MovementKind::Trigger).with_speed(0.0);
        assert!(h.with_ctx(0.0, |ctx| mp.update_config(ctx, bad)).is_err());
        assert_eq!(mp.kind(), MovementKind::Loop);
    }

    #[test]
    fn test_update_config_kind_change_keeps_old_strategy_on_failure() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let three = points(&[Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0)]);
        let mut mp = MovingPlatform::new(PlatformConfig::default().with_speed(3.0), three);
        h.with_ctx(0.0, |ctx| mp.start_movement(ctx)).unwrap();
        assert!(mp.is_moving());

        let gravity = PlatformConfig::of_kind(MovementKind::Gravity);
        let result = h.with_ctx(0.0, |ctx| mp.update_config(ctx, gravity));
        assert_eq!(
            result,
            Err(PlatformError::WrongWaypointCount {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(mp.kind(), MovementKind::Loop);
        assert_eq!(mp.config().move_speed, 3.0);
        assert!(mp.is_initialized());
        assert!(mp.is_moving());
    }

    #[test]
    fn test_set_waypoints_validates_and_restarts() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp =
            MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO, Vec2::ONE]));
        h.with_ctx(0.0, |ctx| mp.start_movement(ctx)).unwrap();
        let err = h.with_ctx(0.0, |ctx| mp.set_waypoints(ctx, points(&[Vec2::ONE])));
        assert_eq!(err, Err(PlatformError::NotEnoughWaypoints(1)));

        let new_path = points(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        h.with_ctx(0.0, |ctx| mp.set_waypoints(ctx, new_path.clone()))
            .unwrap();
        assert!(mp.is_moving());
        assert_eq!(mp.waypoint_source(), &new_path);
    }

    #[test]
    fn test_gravity_queries_need_gravity_kind() {
        let mut h = Harness::new(Vec2::ZERO, &[]);
        let mut mp =
            MovingPlatform::new(PlatformConfig::default(), points(&[Vec2::ZERO, Vec2::ONE]));
        assert!(h.with_ctx(0.0, |ctx| mp.can_move_with_gravity(ctx)).is_err());
        assert!(h.with_ctx(0.0, |ctx| mp.force_move_to(ctx, 1)).is_err());
        assert!(mp.gravity_direction(&WorldState::default()).is_err());
    }
}
