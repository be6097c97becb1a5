//! Two-waypoint platforms that slide toward whichever end lies "downhill".
//!
//! While started, the strategy polls every `gravity_check_interval` seconds.
//! A poll that finds the platform idle picks the waypoint whose direction is
//! closest to world gravity (within `gravity_tolerance` degrees), probes a
//! short segment toward it for obstacles and, if clear, tweens there. During
//! the move the probe is repeated every frame and an obstacle stops the
//! platform on the spot; the next attempt waits for the next poll.
//!
//! Gravity is taken in world space and never follows the level rotation. A
//! rotation that starts mid-move pauses the tween; the first poll after the
//! rotation resumes it only if the gravity target is still the same.

use glam::Vec2;
use log::{debug, error, warn};

use super::obstacle::NEGLIGIBLE_DISTANCE;
use super::{MovementBehavior, MovementContext, WorldState};
use crate::components::platformconfig::PlatformConfig;
use crate::components::tween::{PathTween, TweenStatus};
use crate::error::PlatformError;
use crate::events::platform::EventKind;
use crate::resources::eventbus::EventBus;

/// Closer than this to the target counts as arrived.
pub const ARRIVAL_EPSILON: f32 = 0.1;

const REQUIRED_WAYPOINTS: usize = 2;

/// Angle used for a waypoint the platform is sitting on.
const NO_MATCH_ANGLE: f32 = f32::MAX;

/// Degrees between `gravity` and the direction from `from` to `to`.
fn angle_to(gravity: Vec2, from: Vec2, to: Vec2) -> f32 {
    let dir = to - from;
    if dir.length_squared() <= f32::EPSILON * f32::EPSILON {
        return NO_MATCH_ANGLE;
    }
    gravity
        .dot(dir.normalize())
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Index of the waypoint gravity pulls toward, if any is within `tolerance`.
pub fn select_gravity_target(
    gravity: Vec2,
    position: Vec2,
    waypoints: &[Vec2],
    tolerance: f32,
) -> Option<usize> {
    if waypoints.len() != REQUIRED_WAYPOINTS {
        return None;
    }
    let gravity = gravity.normalize_or_zero();
    if gravity == Vec2::ZERO {
        return None;
    }
    let a0 = angle_to(gravity, position, waypoints[0]);
    let a1 = angle_to(gravity, position, waypoints[1]);
    if a0 <= tolerance && a0 <= a1 {
        Some(0)
    } else if a1 <= tolerance {
        Some(1)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct GravityMovement {
    config: PlatformConfig,
    /// Poll loop running.
    active: bool,
    next_poll_at: f32,
    tween: Option<PathTween>,
    moving: bool,
    target_index: Option<usize>,
    current_index: usize,
    paused: bool,
    paused_by_rotation: bool,
}

impl GravityMovement {
    pub fn new(config: PlatformConfig) -> Self {
        GravityMovement {
            config,
            active: false,
            next_poll_at: 0.0,
            tween: None,
            moving: false,
            target_index: None,
            current_index: 0,
            paused: false,
            paused_by_rotation: false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.active
    }

    /// Waypoint the running tween heads to.
    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    /// Waypoint most recently moved to.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Unit world gravity used for target selection.
    pub fn gravity_direction(&self, world: &WorldState) -> Vec2 {
        world.gravity.normalize_or_zero()
    }

    pub fn gravity_target(&self, ctx: &MovementContext) -> Option<usize> {
        select_gravity_target(
            ctx.world.gravity,
            ctx.world_position(),
            &ctx.waypoints,
            self.config.gravity_tolerance,
        )
    }

    /// Unit direction toward the gravity target, zero when there is none.
    pub fn next_move_direction(&self, ctx: &MovementContext) -> Vec2 {
        match self.gravity_target(ctx) {
            Some(i) => (ctx.waypoints[i] - ctx.world_position()).normalize_or_zero(),
            None => Vec2::ZERO,
        }
    }

    /// Whether a poll right now would start a move.
    pub fn can_move_now(&self, ctx: &MovementContext) -> bool {
        if ctx.waypoints.len() != REQUIRED_WAYPOINTS {
            return false;
        }
        let Some(index) = self.gravity_target(ctx) else {
            return false;
        };
        let position = ctx.world_position();
        let target = ctx.waypoints[index];
        if position.distance(target) < ARRIVAL_EPSILON {
            return false;
        }
        !self.path_blocked(ctx, target)
    }

    /// Snap to waypoint `index` regardless of gravity and obstacles, then
    /// restart polling from there.
    pub fn force_move_to(
        &mut self,
        ctx: &mut MovementContext,
        index: usize,
    ) -> Result<(), PlatformError> {
        if ctx.waypoints.len() != REQUIRED_WAYPOINTS {
            return Err(PlatformError::WrongWaypointCount {
                expected: REQUIRED_WAYPOINTS,
                found: ctx.waypoints.len(),
            });
        }
        if index >= REQUIRED_WAYPOINTS {
            return Err(PlatformError::Config(format!(
                "waypoint index {} out of range",
                index
            )));
        }
        self.stop(ctx);
        *ctx.local_position = ctx.to_local(ctx.waypoints[index]);
        self.current_index = index;
        debug!(
            "Gravity platform {:?} forced to waypoint {}",
            ctx.platform, index
        );
        self.start(ctx);
        Ok(())
    }

    /// Probe `min(obstacle_check_distance, distance)` toward `target`.
    fn path_blocked(&self, ctx: &MovementContext, target: Vec2) -> bool {
        let position = ctx.world_position();
        let offset = target - position;
        let distance = offset.length();
        if distance < NEGLIGIBLE_DISTANCE {
            return false;
        }
        let probe = self.config.obstacle_check_distance.min(distance);
        let end = position + offset / distance * probe;
        let detector = ctx.obstacle_detector(self.config.obstacle_layers);
        match detector.blocking_hit(ctx.footprint.as_ref(), position, end) {
            Some(hit) => {
                debug!(
                    "Gravity platform {:?} blocked by {:?} at {:.2}",
                    ctx.platform, hit.entity, hit.distance
                );
                true
            }
            None => false,
        }
    }

    fn move_to(&mut self, ctx: &mut MovementContext, index: usize) {
        let target_world = ctx.waypoints[index];
        let distance = ctx.world_position().distance(target_world);
        let target_local = ctx.to_local(target_world);
        let mut tween = PathTween::new(
            [*ctx.local_position, target_local],
            distance / self.config.move_speed,
        )
        .with_easing(self.config.easing);
        if self.paused {
            tween.pause();
        }
        debug!(
            "Gravity platform {:?} moving to waypoint {} ({:.2} units)",
            ctx.platform, index, distance
        );
        self.tween = Some(tween);
        self.moving = true;
        self.paused_by_rotation = false;
        self.target_index = Some(index);
        self.current_index = index;
        ctx.publish(EventKind::PlatformStartMove);
    }

    /// Drop the tween, publishing stop if one was alive.
    fn kill_tween(&mut self, ctx: &mut MovementContext) {
        let had_tween = self.tween.take().is_some();
        self.moving = false;
        self.paused_by_rotation = false;
        self.target_index = None;
        if had_tween {
            ctx.publish(EventKind::PlatformStopMove);
        }
    }

    fn poll(&mut self, ctx: &mut MovementContext) {
        if ctx.world.in_rotation {
            return;
        }
        self.next_poll_at = ctx.now + self.config.gravity_check_interval;

        if self.paused_by_rotation {
            let target = self.gravity_target(ctx);
            if target == self.target_index {
                self.paused_by_rotation = false;
                if !self.paused
                    && let Some(tween) = self.tween.as_mut()
                {
                    tween.play();
                }
            } else {
                debug!(
                    "Gravity platform {:?} target changed during rotation ({:?} -> {:?})",
                    ctx.platform, self.target_index, target
                );
                self.kill_tween(ctx);
            }
            return;
        }

        if self.moving {
            return;
        }
        if self.can_move_now(ctx) {
            if let Some(index) = self.gravity_target(ctx) {
                self.move_to(ctx, index);
            }
        } else {
            debug!(
                "Gravity platform {:?} waiting, target {:?}",
                ctx.platform,
                self.gravity_target(ctx)
            );
        }
    }

    fn advance(&mut self, ctx: &mut MovementContext) {
        if ctx.world.in_rotation {
            if !self.paused_by_rotation {
                self.paused_by_rotation = true;
                if let Some(tween) = self.tween.as_mut() {
                    tween.pause();
                }
            }
            return;
        }
        if self.paused_by_rotation || self.paused {
            return;
        }
        if let Some(index) = self.target_index
            && self.path_blocked(ctx, ctx.waypoints[index])
        {
            debug!("Gravity platform {:?} stopped by an obstacle", ctx.platform);
            self.kill_tween(ctx);
            return;
        }
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        let status = tween.advance(ctx.delta);
        *ctx.local_position = tween.position();
        if status == TweenStatus::Finished {
            self.tween = None;
            self.moving = false;
            self.target_index = None;
            ctx.publish(EventKind::PlatformStopMove);
        }
    }
}

impl MovementBehavior for GravityMovement {
    fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        if ctx.waypoints.len() != REQUIRED_WAYPOINTS {
            return Err(PlatformError::WrongWaypointCount {
                expected: REQUIRED_WAYPOINTS,
                found: ctx.waypoints.len(),
            });
        }
        Ok(())
    }

    fn start(&mut self, ctx: &mut MovementContext) {
        if ctx.waypoints.len() != REQUIRED_WAYPOINTS {
            error!(
                "Gravity platform {:?} needs exactly {} waypoints, got {}",
                ctx.platform,
                REQUIRED_WAYPOINTS,
                ctx.waypoints.len()
            );
            return;
        }
        if self.active {
            debug!("Gravity platform {:?} is already polling", ctx.platform);
            return;
        }
        self.active = true;
        self.next_poll_at = ctx.now;
        self.poll(ctx);
    }

    fn stop(&mut self, ctx: &mut MovementContext) {
        self.active = false;
        self.paused = false;
        self.kill_tween(ctx);
    }

    fn pause(&mut self, _ctx: &mut MovementContext) {
        self.paused = true;
        if let Some(tween) = self.tween.as_mut() {
            tween.pause();
        }
    }

    fn resume(&mut self, _ctx: &mut MovementContext) {
        self.paused = false;
        if !self.paused_by_rotation
            && let Some(tween) = self.tween.as_mut()
        {
            tween.play();
        }
    }

    fn on_trigger_activated(&mut self, ctx: &mut MovementContext) {
        debug!("Gravity platform {:?} ignores triggers", ctx.platform);
    }

    fn update(&mut self, ctx: &mut MovementContext) {
        if self.moving && self.tween.is_none() {
            warn!(
                "Gravity platform {:?} lost its tween while moving, resetting to idle",
                ctx.platform
            );
            self.moving = false;
            self.target_index = None;
            self.paused_by_rotation = false;
        }
        if !self.active {
            return;
        }
        if self.moving {
            self.advance(ctx);
        }
        if ctx.now >= self.next_poll_at {
            self.poll(ctx);
        }
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn reset(&mut self, ctx: &mut MovementContext) {
        self.stop(ctx);
        if ctx.waypoints.len() != REQUIRED_WAYPOINTS {
            return;
        }
        let position = ctx.world_position();
        let nearest = if position.distance_squared(ctx.waypoints[0])
            <= position.distance_squared(ctx.waypoints[1])
        {
            0
        } else {
            1
        };
        *ctx.local_position = ctx.to_local(ctx.waypoints[nearest]);
        self.current_index = nearest;
        self.start(ctx);
    }

    fn on_destroy(&mut self, _bus: &mut EventBus) {
        self.active = false;
        self.tween = None;
        self.moving = false;
        self.target_index = None;
        self.paused_by_rotation = false;
    }

    fn configure(&mut self, config: &PlatformConfig) {
        self.config = config.clone();
    }
}
