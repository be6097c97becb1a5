//! Endless back-and-forth (or round-trip) travel along the waypoints.
//!
//! The path starts at the platform's current position and visits every
//! waypoint in order. With `reverse_on_complete` the tween ping-pongs
//! (Yoyo); otherwise it jumps back to its start (Restart), optionally
//! closing the loop through the first waypoint first.

use log::{debug, warn};
use smallvec::SmallVec;

use super::{MovementBehavior, MovementContext};
use crate::components::platformconfig::PlatformConfig;
use crate::components::tween::{LoopMode, PathTween, TweenStatus};
use crate::error::PlatformError;
use crate::events::platform::EventKind;
use crate::resources::eventbus::EventBus;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LoopState {
    Idle,
    /// Start was requested during a level rotation.
    WaitingForRotation,
    WaitingInitialDelay { until: f32 },
    Moving,
    PausedByRotation,
    /// Resting at a path end.
    Dwelling { until: f32 },
}

#[derive(Debug)]
pub struct LoopMovement {
    config: PlatformConfig,
    state: LoopState,
    tween: Option<PathTween>,
    moving: bool,
    /// Paused by `pause`, as opposed to by rotation.
    paused: bool,
}

impl LoopMovement {
    pub fn new(config: PlatformConfig) -> Self {
        LoopMovement {
            config,
            state: LoopState::Idle,
            tween: None,
            moving: false,
            paused: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn tween(&self) -> Option<&PathTween> {
        self.tween.as_ref()
    }

    fn begin_after_rotation(&mut self, ctx: &mut MovementContext) {
        if self.config.initial_delay > 0.0 {
            self.state = LoopState::WaitingInitialDelay {
                until: ctx.now + self.config.initial_delay,
            };
        } else {
            self.launch(ctx);
        }
    }

    fn launch(&mut self, ctx: &mut MovementContext) {
        let mut points: SmallVec<[_; 4]> = ctx.local_waypoints();
        if points.len() < 2 {
            warn!(
                "Loop platform {:?} needs at least 2 waypoints, got {}",
                ctx.platform,
                points.len()
            );
            self.state = LoopState::Idle;
            return;
        }
        let loop_mode = if self.config.reverse_on_complete {
            LoopMode::Yoyo
        } else {
            if self.config.close_path && points.len() >= 3 {
                let first = points[0];
                points.push(first);
            }
            LoopMode::Restart
        };
        let mut tween = PathTween::along(*ctx.local_position, &points, self.config.move_speed)
            .with_easing(self.config.easing)
            .with_loop_mode(loop_mode);
        if tween.duration() <= 0.0 {
            warn!("Loop platform {:?} has a zero-length path", ctx.platform);
            self.state = LoopState::Idle;
            return;
        }
        debug!(
            "Loop platform {:?} started, {:.2}s per cycle ({:?})",
            ctx.platform,
            tween.duration(),
            loop_mode
        );
        if self.paused {
            // a pause issued while waiting holds the fresh tween too
            tween.pause();
        }
        self.tween = Some(tween);
        self.moving = true;
        self.state = LoopState::Moving;
        ctx.publish(EventKind::PlatformStartMove);
    }

    /// Self-heal when the flags and the tween disagree.
    fn guard(&mut self, ctx: &MovementContext) -> bool {
        let needs_tween = matches!(
            self.state,
            LoopState::Moving | LoopState::PausedByRotation | LoopState::Dwelling { .. }
        );
        if (self.moving || needs_tween) && self.tween.is_none() {
            warn!(
                "Loop platform {:?} lost its tween while moving, resetting to idle",
                ctx.platform
            );
            self.moving = false;
            self.state = LoopState::Idle;
            return false;
        }
        true
    }
}

impl MovementBehavior for LoopMovement {
    fn initialize(&mut self, ctx: &mut MovementContext) -> Result<(), PlatformError> {
        if ctx.waypoints.len() < 2 {
            return Err(PlatformError::NotEnoughWaypoints(ctx.waypoints.len()));
        }
        Ok(())
    }

    fn start(&mut self, ctx: &mut MovementContext) {
        if self.state != LoopState::Idle {
            debug!("Loop platform {:?} is already running", ctx.platform);
            return;
        }
        if ctx.world.in_rotation {
            debug!(
                "Loop platform {:?} waits for the level rotation to end",
                ctx.platform
            );
            self.state = LoopState::WaitingForRotation;
            return;
        }
        self.begin_after_rotation(ctx);
    }

    fn stop(&mut self, ctx: &mut MovementContext) {
        let had_tween = self.tween.take().is_some();
        self.moving = false;
        self.paused = false;
        self.state = LoopState::Idle;
        if had_tween {
            ctx.publish(EventKind::PlatformStopMove);
        }
    }

    fn pause(&mut self, ctx: &mut MovementContext) {
        if self.state == LoopState::Idle {
            debug!("Loop platform {:?} is not running", ctx.platform);
            return;
        }
        self.paused = true;
        if let Some(tween) = self.tween.as_mut() {
            tween.pause();
        }
    }

    fn resume(&mut self, ctx: &mut MovementContext) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if self.state == LoopState::Moving
            && !ctx.world.in_rotation
            && let Some(tween) = self.tween.as_mut()
        {
            tween.play();
        }
    }

    fn on_trigger_activated(&mut self, ctx: &mut MovementContext) {
        debug!("Loop platform {:?} ignores triggers", ctx.platform);
    }

    fn update(&mut self, ctx: &mut MovementContext) {
        if !self.guard(ctx) {
            return;
        }
        match self.state {
            LoopState::Idle => {}
            LoopState::WaitingForRotation => {
                if !ctx.world.in_rotation {
                    self.begin_after_rotation(ctx);
                }
            }
            LoopState::WaitingInitialDelay { until } => {
                if ctx.now >= until && !ctx.world.in_rotation {
                    self.launch(ctx);
                }
            }
            LoopState::Moving => {
                let Some(tween) = self.tween.as_mut() else {
                    return;
                };
                if ctx.world.in_rotation {
                    tween.pause();
                    self.state = LoopState::PausedByRotation;
                    return;
                }
                let status = tween.advance(ctx.delta);
                *ctx.local_position = tween.position();
                if status == TweenStatus::CycleCompleted && self.config.wait_time_at_waypoint > 0.0
                {
                    tween.pause();
                    self.state = LoopState::Dwelling {
                        until: ctx.now + self.config.wait_time_at_waypoint,
                    };
                }
            }
            LoopState::PausedByRotation => {
                if !ctx.world.in_rotation {
                    if let Some(tween) = self.tween.as_mut()
                        && !self.paused
                    {
                        tween.play();
                    }
                    self.state = LoopState::Moving;
                }
            }
            LoopState::Dwelling { until } => {
                if ctx.now < until {
                    return;
                }
                if ctx.world.in_rotation {
                    self.state = LoopState::PausedByRotation;
                    return;
                }
                if let Some(tween) = self.tween.as_mut()
                    && !self.paused
                {
                    tween.play();
                }
                self.state = LoopState::Moving;
            }
        }
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn reset(&mut self, ctx: &mut MovementContext) {
        self.stop(ctx);
    }

    fn on_destroy(&mut self, _bus: &mut EventBus) {
        self.tween = None;
        self.moving = false;
        self.paused = false;
        self.state = LoopState::Idle;
    }

    fn configure(&mut self, config: &PlatformConfig) {
        self.config = config.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::test_support::Harness;
    use glam::Vec2;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn started(h: &mut Harness, config: PlatformConfig) -> LoopMovement {
        let mut s = LoopMovement::new(config);
        h.with_ctx(0.0, |ctx| {
            s.initialize(ctx).unwrap();
            s.start(ctx);
        });
        s
    }

    #[test]
    fn test_rejects_single_waypoint() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO]);
        let mut s = LoopMovement::new(PlatformConfig::default());
        let result = h.with_ctx(0.0, |ctx| s.initialize(ctx));
        assert_eq!(result, Err(PlatformError::NotEnoughWaypoints(1)));
    }

    #[test]
    fn test_yoyo_cycle_returns_to_start() {
        let start = Vec2::new(0.0, 0.0);
        let mut h = Harness::new(start, &[start, Vec2::new(1.0, 0.0)]);
        let mut s = started(&mut h, PlatformConfig::default().with_speed(1.0));
        assert!(s.is_moving());
        for _ in 0..4 {
            h.step(&mut s, 0.25);
        }
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));
        for _ in 0..4 {
            h.step(&mut s, 0.25);
        }
        assert!(approx_eq(h.position, start));
    }

    #[test]
    fn test_restart_closes_path_through_first_waypoint() {
        let wps = [Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0)];
        let mut h = Harness::new(Vec2::ZERO, &wps);
        let mut config = PlatformConfig::default().with_speed(1.0);
        config.reverse_on_complete = false;
        let s = started(&mut h, config);
        let tween = s.tween().unwrap();
        assert_eq!(tween.points().len(), 4);
        assert!(approx_eq(tween.end_point(), Vec2::ZERO));
    }

    #[test]
    fn test_rotation_pauses_and_resumes() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(4.0, 0.0)]);
        let mut s = started(&mut h, PlatformConfig::default().with_speed(1.0));
        h.step(&mut s, 1.0);
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));

        h.world.in_rotation = true;
        for _ in 0..5 {
            h.step(&mut s, 1.0);
        }
        assert_eq!(s.state(), LoopState::PausedByRotation);
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));

        h.world.in_rotation = false;
        h.step(&mut s, 0.0);
        for _ in 0..3 {
            h.step(&mut s, 1.0);
        }
        assert!(approx_eq(h.position, Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn test_start_during_rotation_defers() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        h.world.in_rotation = true;
        let mut s = started(&mut h, PlatformConfig::default());
        assert_eq!(s.state(), LoopState::WaitingForRotation);
        assert!(!s.is_moving());
        h.world.in_rotation = false;
        h.step(&mut s, 0.1);
        assert_eq!(s.state(), LoopState::Moving);
    }

    #[test]
    fn test_initial_delay_and_dwell() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        let mut config = PlatformConfig::default().with_speed(1.0);
        config.initial_delay = 0.5;
        config.wait_time_at_waypoint = 1.0;
        let mut s = started(&mut h, config);
        assert!(matches!(s.state(), LoopState::WaitingInitialDelay { .. }));
        h.step(&mut s, 0.5);
        assert_eq!(s.state(), LoopState::Moving);
        h.step(&mut s, 1.0);
        assert!(matches!(s.state(), LoopState::Dwelling { .. }));
        h.step(&mut s, 0.5);
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));
        h.step(&mut s, 0.5);
        assert_eq!(s.state(), LoopState::Moving);
        h.step(&mut s, 0.5);
        assert!(approx_eq(h.position, Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn test_stop_publishes_and_clears() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        let stops = Arc::new(AtomicUsize::new(0));
        let stops_in = stops.clone();
        h.bus.subscribe(
            EventKind::PlatformStopMove,
            Box::new(move |_, _| {
                stops_in.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let mut s = started(&mut h, PlatformConfig::default());
        h.with_ctx(0.0, |ctx| s.stop(ctx));
        h.with_ctx(0.0, |ctx| s.stop(ctx));
        assert!(!s.is_moving());
        assert!(s.tween().is_none());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_pause_holds_position() {
        let mut h = Harness::new(Vec2::ZERO, &[Vec2::ZERO, Vec2::new(4.0, 0.0)]);
        let mut s = started(&mut h, PlatformConfig::default().with_speed(1.0));
        h.step(&mut s, 1.0);
        h.with_ctx(0.0, |ctx| s.pause(ctx));
        h.step(&mut s, 1.0);
        assert!(approx_eq(h.position, Vec2::new(1.0, 0.0)));
        h.with_ctx(0.0, |ctx| s.resume(ctx));
        h.step(&mut s, 1.0);
        assert!(approx_eq(h.position, Vec2::new(2.0, 0.0)));
    }
}
