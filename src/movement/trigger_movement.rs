//! Platforms that move once per activation.
//!
//! Activations arrive either directly through
//! [`MovementBehavior::on_trigger_activated`] or as
//! [`EventKind::PlatformTrigger`] events on the bus. The strategy subscribes
//! on initialize (scoped to its platform) and forwards matching events into a
//! channel that is drained at the start of every update, so activation logic
//! always runs with a full [`MovementContext`].
//!
//! An activation is rejected when the platform is single-use and already
//! fired, when the cooldown since the last accepted activation has not
//! elapsed, or while the platform is still busy with a previous move. An
//! activation that arrives during a level rotation is parked and executed
//! once the rotation ends.

use crossbeam_channel::{Receiver, unbounded};
use glam::Vec2;
use log::{debug, warn};
use smallvec::SmallVec;

use super::{MovementBehavior, MovementContext};
use crate::components::platformconfig::{PlatformConfig, TriggerMode};
use crate::components::tween::{PathTween, TweenStatus};
use crate::error::PlatformError;
use crate::events::platform::{EventKind, EventPayload};
use crate::resources::eventbus::{EventBus, SubscriptionId};

/// Pause between arriving and heading back when `return_to_start` is set.
pub const RETURN_SETTLE_DELAY: f32 = 0.5;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TriggerState {
    Idle,
    /// Accepted, waiting out `initial_delay`.
    Delayed { until: f32 },
    Moving,
    /// Arrived, waiting before the return trip.
    Settling { until: f32 },
    Returning,
}

#[derive(Debug)]
pub struct TriggerMovement {
    config: PlatformConfig,
    state: TriggerState,
    tween: Option<PathTween>,
    /// Path of an accepted activation still in its initial delay.
    delayed_path: SmallVec<[Vec2; 4]>,
    moving: bool,
    paused: bool,
    paused_by_rotation: bool,
    cursor: usize,
    origin: Option<Vec2>,
    last_trigger_time: Option<f32>,
    activations: u32,
    pending_after_rotation: bool,
    subscription: Option<SubscriptionId>,
    inbox: Option<Receiver<()>>,
}

impl TriggerMovement {
    pub fn new(config: PlatformConfig) -> Self {
        TriggerMovement {
            config,
            state: TriggerState::Idle,
            tween: None,
            delayed_path: SmallVec::new(),
            moving: false,
            paused: false,
            paused_by_rotation: false,
            cursor: 0,
            origin: None,
            last_trigger_time: None,
            activations: 0,
            pending_after_rotation: false,
            subscription: None,
            inbox: None,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Index of the waypoint last moved to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_trigger_time(&self) -> Option<f32> {
        self.last_trigger_time
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn has_pending_activation(&self) -> bool {
        self.pending_after_rotation
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    fn is_busy(&self) -> bool {
        self.state != TriggerState::Idle
    }

    fn subscribe(&mut self, ctx: &mut MovementContext) {
        if self.subscription.is_some() {
            return;
        }
        let (tx, rx) = unbounded::<()>();
        let platform = ctx.platform;
        let id = ctx.bus.subscribe_scoped(
            EventKind::PlatformTrigger,
            platform,
            Box::new(move |_, payload| {
                if let Some(EventPayload::Platform(target)) = payload
                    && *target == platform
                {
                    let _ = tx.send(());
                }
            }),
        );
        self.subscription = Some(id);
        self.inbox = Some(rx);
    }

    fn next_path(&mut self, ctx: &MovementContext) -> SmallVec<[Vec2; 4]> {
        let local = ctx.local_waypoints();
        if local.len() < 2 {
            return SmallVec::new();
        }
        match self.config.trigger_mode {
            TriggerMode::SinglePath => {
                let next = (self.cursor + 1) % local.len();
                self.cursor = next;
                SmallVec::from_elem(local[next], 1)
            }
            TriggerMode::FullPath => local,
        }
    }

    fn activate(&mut self, ctx: &mut MovementContext) {
        let path = self.next_path(ctx);
        if path.is_empty() {
            warn!(
                "Trigger platform {:?} has no valid path to follow",
                ctx.platform
            );
            return;
        }
        self.activations += 1;
        self.last_trigger_time = Some(ctx.now);
        if self.config.initial_delay > 0.0 {
            self.delayed_path = path;
            self.state = TriggerState::Delayed {
                until: ctx.now + self.config.initial_delay,
            };
        } else {
            self.launch(ctx, &path, TriggerState::Moving);
        }
    }

    fn launch(&mut self, ctx: &mut MovementContext, path: &[Vec2], state: TriggerState) {
        let mut tween = PathTween::along(*ctx.local_position, path, self.config.move_speed)
            .with_easing(self.config.easing);
        if self.paused {
            tween.pause();
        }
        debug!(
            "Trigger platform {:?} moving for {:.2}s ({:?})",
            ctx.platform,
            tween.duration(),
            state
        );
        self.tween = Some(tween);
        self.moving = true;
        self.paused_by_rotation = false;
        self.state = state;
        ctx.publish(EventKind::PlatformStartMove);
    }

    fn advance_tween(&mut self, ctx: &mut MovementContext) {
        let Some(tween) = self.tween.as_mut() else {
            warn!(
                "Trigger platform {:?} lost its tween while moving, resetting to idle",
                ctx.platform
            );
            self.moving = false;
            self.state = TriggerState::Idle;
            return;
        };
        if ctx.world.in_rotation {
            if !self.paused_by_rotation {
                self.paused_by_rotation = true;
                tween.pause();
            }
            return;
        }
        if self.paused_by_rotation {
            self.paused_by_rotation = false;
            if !self.paused {
                tween.play();
            }
        }
        let status = tween.advance(ctx.delta);
        *ctx.local_position = tween.position();
        if status != TweenStatus::Finished {
            return;
        }

        self.tween = None;
        self.moving = false;
        ctx.publish(EventKind::PlatformStopMove);
        match self.state {
            TriggerState::Moving if self.config.return_to_start => {
                self.state = TriggerState::Settling {
                    until: ctx.now + RETURN_SETTLE_DELAY,
                };
            }
            TriggerState::Returning => {
                if self.config.can_trigger_multiple_times {
                    self.cursor = 0;
                }
                self.state = TriggerState::Idle;
            }
            _ => self.state = TriggerState::Idle,
        }
    }
}

impl MovementBehavior for TriggerMovement {
    fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        if ctx.waypoints.len() < 2 {
            return Err(PlatformError::NotEnoughWaypoints(ctx.waypoints.len()));
        }
        if self.origin.is_none() {
            self.origin = Some(*ctx.local_position);
        }
        self.subscribe(ctx);
        Ok(())
    }

    fn start(&mut self, ctx: &mut MovementContext) {
        debug!("Trigger platform {:?} armed, waiting for activation", ctx.platform);
    }

    fn stop(&mut self, ctx: &mut MovementContext) {
        let had_tween = self.tween.take().is_some();
        self.moving = false;
        self.paused = false;
        self.paused_by_rotation = false;
        self.pending_after_rotation = false;
        self.delayed_path.clear();
        self.state = TriggerState::Idle;
        if had_tween {
            ctx.publish(EventKind::PlatformStopMove);
        }
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
        if !self.config.can_trigger_multiple_times && self.activations > 0 {
            debug!("Trigger platform {:?} is single-use and spent", ctx.platform);
            return;
        }
        if let Some(last) = self.last_trigger_time
            && self.config.trigger_cooldown > 0.0
            && ctx.now - last < self.config.trigger_cooldown
        {
            debug!(
                "Trigger platform {:?} on cooldown, {:.2}s left",
                ctx.platform,
                self.config.trigger_cooldown - (ctx.now - last)
            );
            return;
        }
        if ctx.world.in_rotation {
            debug!(
                "Trigger platform {:?} activation queued until rotation ends",
                ctx.platform
            );
            self.pending_after_rotation = true;
            return;
        }
        if self.is_busy() {
            debug!("Trigger platform {:?} is busy, activation ignored", ctx.platform);
            return;
        }
        self.activate(ctx);
    }

    fn update(&mut self, ctx: &mut MovementContext) {
        let received = self.inbox.as_ref().map_or(0, |rx| rx.try_iter().count());
        for _ in 0..received {
            self.on_trigger_activated(ctx);
        }

        if self.pending_after_rotation && !ctx.world.in_rotation {
            self.pending_after_rotation = false;
            if self.is_busy() {
                debug!(
                    "Trigger platform {:?} still busy, queued activation dropped",
                    ctx.platform
                );
            } else {
                self.activate(ctx);
            }
        }

        match self.state {
            TriggerState::Idle => {
                if self.moving {
                    warn!(
                        "Trigger platform {:?} flagged moving while idle, resetting",
                        ctx.platform
                    );
                    self.moving = false;
                    self.tween = None;
                }
            }
            TriggerState::Delayed { until } => {
                if ctx.now >= until && !ctx.world.in_rotation {
                    let path = std::mem::take(&mut self.delayed_path);
                    self.launch(ctx, &path, TriggerState::Moving);
                }
            }
            TriggerState::Moving | TriggerState::Returning => self.advance_tween(ctx),
            TriggerState::Settling { until } => {
                if ctx.now >= until && !ctx.world.in_rotation {
                    let origin = self.origin.unwrap_or(*ctx.local_position);
                    self.launch(ctx, &[origin], TriggerState::Returning);
                }
            }
        }
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn reset(&mut self, ctx: &mut MovementContext) {
        self.stop(ctx);
        self.cursor = 0;
        self.last_trigger_time = None;
        self.activations = 0;
    }

    fn on_destroy(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(EventKind::PlatformTrigger, id);
        }
        self.inbox = None;
        self.tween = None;
        self.moving = false;
        self.pending_after_rotation = false;
        self.state = TriggerState::Idle;
    }

    fn configure(&mut self, config: &PlatformConfig) {
        self.config = config.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::test_support::Harness;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn armed(h: &mut Harness, config: PlatformConfig) -> TriggerMovement {
        let mut s = TriggerMovement::new(config);
        h.with_ctx(0.0, |ctx| {
            s.initialize(ctx).unwrap();
            s.start(ctx);
        });
        s
    }

    fn trigger(h: &mut Harness, s: &mut TriggerMovement) {
        h.with_ctx(0.0, |ctx| s.on_trigger_activated(ctx));
    }

    fn config() -> PlatformConfig {
        let mut c = PlatformConfig::of_kind(crate::components::platformconfig::MovementKind::Trigger)
            .with_speed(1.0);
        c.trigger_cooldown = 1.0;
        c
    }

    #[test]
    fn test_single_path_round_robin() {
        let wps = [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let mut h = Harness::new(Vec2::ZERO, &wps);
        let mut s = armed(&mut h, config());
        assert!(!s.is_moving());

        trigger(&mut h, &mut s);
        assert!(s.is_moving());
        assert_eq!(s.cursor(), 1);
        for _ in 0..4 {
            h.step(&mut s, 0.25);
        }
        assert!(!s.is_moving());
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));

        h.step(&mut s, 1.0);
        trigger(&mut h, &mut s);
        for _ in 0..4 {
            h.step(&mut s, 0.25);
        }
        assert!(approx_eq(h.position, Vec2::new(1.0, 1.0)));
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn test_cooldown_counts_from_activation() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(0.25, 0.0)]);
        let mut s = armed(&mut h, config());
        trigger(&mut h, &mut s);
        h.step(&mut s, 0.5);
        assert!(!s.is_moving());
        // 0.5s after the first activation: still cooling down
        trigger(&mut h, &mut s);
        assert!(!s.is_moving());
        assert_eq!(s.activations(), 1);
        h.step(&mut s, 0.5);
        trigger(&mut h, &mut s);
        assert!(s.is_moving());
        assert_eq!(s.activations(), 2);
    }

    #[test]
    fn test_single_use() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(0.5, 0.0)]);
        let mut c = config();
        c.can_trigger_multiple_times = false;
        let mut s = armed(&mut h, c);
        trigger(&mut h, &mut s);
        for _ in 0..10 {
            h.step(&mut s, 0.5);
        }
        trigger(&mut h, &mut s);
        assert_eq!(s.activations(), 1);
        assert!(!s.is_moving());
    }

    #[test]
    fn test_full_path_and_return_to_start() {
        let wps = [Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        let mut h = Harness::new(Vec2::ZERO, &wps);
        let mut c = config();
        c.trigger_mode = TriggerMode::FullPath;
        c.return_to_start = true;
        let mut s = armed(&mut h, c);
        trigger(&mut h, &mut s);
        for _ in 0..8 {
            h.step(&mut s, 0.25);
        }
        assert!(approx_eq(h.position, Vec2::new(1.0, 1.0)));
        assert!(matches!(s.state(), TriggerState::Settling { .. }));

        h.step(&mut s, RETURN_SETTLE_DELAY);
        assert_eq!(s.state(), TriggerState::Returning);
        while s.is_moving() {
            h.step(&mut s, 0.1);
        }
        assert!(approx_eq(h.position, Vec2::ZERO));
        assert_eq!(s.state(), TriggerState::Idle);
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_activation_during_rotation_is_queued_once() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        let mut s = armed(&mut h, config());
        h.world.in_rotation = true;
        trigger(&mut h, &mut s);
        trigger(&mut h, &mut s);
        assert!(s.has_pending_activation());
        assert!(!s.is_moving());
        h.step(&mut s, 0.1);
        assert!(!s.is_moving());

        h.world.in_rotation = false;
        h.step(&mut s, 0.1);
        assert!(s.is_moving());
        assert_eq!(s.activations(), 1);
        assert!(!s.has_pending_activation());
    }

    #[test]
    fn test_bus_trigger_reaches_only_its_platform() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        let mut s = armed(&mut h, config());
        assert!(s.is_subscribed());
        let mut scratch = bevy_ecs::world::World::new();
        scratch.spawn_empty();
        let other = scratch.spawn_empty().id();
        assert_ne!(other, h.platform);
        h.bus
            .publish(EventKind::PlatformTrigger, Some(EventPayload::Platform(other)));
        h.step(&mut s, 0.0);
        assert!(!s.is_moving());

        let me = h.platform;
        h.bus
            .publish(EventKind::PlatformTrigger, Some(EventPayload::Platform(me)));
        h.step(&mut s, 0.0);
        assert!(s.is_moving());

        s.on_destroy(&mut h.bus);
        assert_eq!(h.bus.handler_count(EventKind::PlatformTrigger), 0);
    }

    #[test]
    fn test_reset_clears_cursor_and_cooldown() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        let mut s = armed(&mut h, config());
        trigger(&mut h, &mut s);
        h.with_ctx(0.0, |ctx| s.reset(ctx));
        assert!(!s.is_moving());
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.last_trigger_time(), None);
        trigger(&mut h, &mut s);
        assert!(s.is_moving());
    }
}
