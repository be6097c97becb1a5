//! Rider bookkeeping for a moving platform.
//!
//! [`PlatformController`] remembers which entities currently stand on the
//! platform and where the platform was on the previous fixed tick. The
//! [`carry_riders`](crate::systems::platformcontroller::carry_riders) system
//! moves every rider by the platform's per-tick displacement, and
//! [`rider_detection_system`](crate::systems::riderdetector::rider_detection_system)
//! feeds membership through [`PlatformController::on_rider_enter`] and
//! [`PlatformController::on_rider_exit`].

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::SmallVec;

use crate::events::platform::{EventKind, EventPayload};
use crate::resources::eventbus::EventBus;

/// Displacements at or below this length are treated as noise.
pub const DEFAULT_CARRY_THRESHOLD: f32 = 0.001;

#[derive(Component, Clone, Debug)]
pub struct PlatformController {
    riders: SmallVec<[Entity; 4]>,
    /// World position at the previous fixed tick.
    last_position: Option<Vec2>,
    pub carry_threshold: f32,
}

impl Default for PlatformController {
    fn default() -> Self {
        Self::new(DEFAULT_CARRY_THRESHOLD)
    }
}

impl PlatformController {
    pub fn new(carry_threshold: f32) -> Self {
        PlatformController {
            riders: SmallVec::new(),
            last_position: None,
            carry_threshold,
        }
    }

    pub fn riders(&self) -> &[Entity] {
        &self.riders
    }

    pub fn has_rider(&self, rider: Entity) -> bool {
        self.riders.contains(&rider)
    }

    /// Add `rider` and publish `RiderOn`. Returns false if already riding.
    pub fn on_rider_enter(&mut self, platform: Entity, rider: Entity, bus: &mut EventBus) -> bool {
        if self.has_rider(rider) {
            return false;
        }
        self.riders.push(rider);
        bus.publish(
            EventKind::RiderOn,
            Some(EventPayload::Rider { platform, rider }),
        );
        true
    }

    /// Remove `rider` and publish `RiderOff`. Returns false if not riding.
    pub fn on_rider_exit(&mut self, platform: Entity, rider: Entity, bus: &mut EventBus) -> bool {
        let Some(index) = self.riders.iter().position(|&r| r == rider) else {
            return false;
        };
        self.riders.swap_remove(index);
        bus.publish(
            EventKind::RiderOff,
            Some(EventPayload::Rider { platform, rider }),
        );
        true
    }

    /// Drop riders for which `alive` is false, without notifications.
    pub fn retain_riders(&mut self, alive: impl Fn(Entity) -> bool) {
        self.riders.retain(|r| alive(*r));
    }

    /// Record `position` and return the displacement since the last tick
    /// when it exceeds the carry threshold.
    pub fn step(&mut self, position: Vec2) -> Option<Vec2> {
        let delta = self.last_position.map(|last| position - last);
        self.last_position = Some(position);
        delta.filter(|d| d.length() > self.carry_threshold)
    }

    /// Forget riders and the reference position without notifications.
    pub fn clear(&mut self) {
        self.riders.clear();
        self.last_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_bus() -> (EventBus, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let mut bus = EventBus::new();
        let on = Arc::new(AtomicUsize::new(0));
        let off = Arc::new(AtomicUsize::new(0));
        let on_in = on.clone();
        let off_in = off.clone();
        bus.subscribe(
            EventKind::RiderOn,
            Box::new(move |_, _| {
                on_in.fetch_add(1, Ordering::SeqCst);
            }),
        );
        bus.subscribe(
            EventKind::RiderOff,
            Box::new(move |_, _| {
                off_in.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (bus, on, off)
    }

    #[test]
    fn test_enter_exit_are_idempotent() {
        let mut world = World::new();
        let platform = world.spawn_empty().id();
        let rider = world.spawn_empty().id();
        let (mut bus, on, off) = counting_bus();
        let mut pc = PlatformController::default();

        assert!(pc.on_rider_enter(platform, rider, &mut bus));
        assert!(!pc.on_rider_enter(platform, rider, &mut bus));
        assert_eq!(pc.riders(), &[rider]);
        assert_eq!(on.load(Ordering::SeqCst), 1);

        assert!(pc.on_rider_exit(platform, rider, &mut bus));
        assert!(!pc.on_rider_exit(platform, rider, &mut bus));
        assert!(pc.riders().is_empty());
        assert_eq!(off.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_step_reports_delta_above_threshold() {
        let mut pc = PlatformController::default();
        assert_eq!(pc.step(Vec2::ZERO), None);
        assert_eq!(pc.step(Vec2::new(0.0005, 0.0)), None);
        let delta = pc.step(Vec2::new(1.0005, 0.0)).unwrap();
        assert!((delta - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_clear_is_silent() {
        let mut world = World::new();
        let platform = world.spawn_empty().id();
        let rider = world.spawn_empty().id();
        let (mut bus, _, off) = counting_bus();
        let mut pc = PlatformController::default();
        pc.on_rider_enter(platform, rider, &mut bus);
        pc.clear();
        assert!(pc.riders().is_empty());
        assert_eq!(off.load(Ordering::SeqCst), 0);
    }
}
