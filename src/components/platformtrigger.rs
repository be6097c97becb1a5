//! Level object that activates Trigger platforms.
//!
//! Firing a [`PlatformTriggerEvent`](crate::events::platformtrigger::PlatformTriggerEvent)
//! for an entity carrying [`PlatformTrigger`] queues a trigger command for
//! each target platform, subject to the trigger's own cooldown and one-shot
//! flag.

use bevy_ecs::prelude::*;

#[derive(Component, Clone, Debug, Default)]
pub struct PlatformTrigger {
    pub targets: Vec<Entity>,
    /// Fire only once until [`PlatformTrigger::reset`].
    pub one_time: bool,
    pub used: bool,
    /// Seconds between two firings.
    pub cooldown: f32,
    pub cooldown_remaining: f32,
}

impl PlatformTrigger {
    pub fn new(targets: impl IntoIterator<Item = Entity>) -> Self {
        let mut trigger = PlatformTrigger::default();
        trigger.set_targets(targets);
        trigger
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown.max(0.0);
        self
    }

    pub fn with_one_time(mut self, one_time: bool) -> Self {
        self.one_time = one_time;
        self
    }

    /// Replace targets, dropping duplicates.
    pub fn set_targets(&mut self, targets: impl IntoIterator<Item = Entity>) {
        self.targets.clear();
        for target in targets {
            self.add_target(target);
        }
    }

    pub fn add_target(&mut self, target: Entity) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn can_fire(&self) -> bool {
        !(self.one_time && self.used) && self.cooldown_remaining <= 0.0
    }

    /// Mark a firing. Returns false if the trigger was not ready.
    pub fn fire(&mut self) -> bool {
        if !self.can_fire() {
            return false;
        }
        self.used = true;
        self.cooldown_remaining = self.cooldown;
        true
    }

    pub fn tick(&mut self, delta: f32) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - delta).max(0.0);
        }
    }

    pub fn reset(&mut self) {
        self.used = false;
        self.cooldown_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_deduplicated() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let trigger = PlatformTrigger::new([a, b, a]);
        assert_eq!(trigger.targets, vec![a, b]);
    }

    #[test]
    fn test_cooldown_blocks_until_ticked() {
        let mut trigger = PlatformTrigger::default().with_cooldown(1.0);
        assert!(trigger.fire());
        assert!(!trigger.fire());
        trigger.tick(0.6);
        assert!(!trigger.can_fire());
        trigger.tick(0.6);
        assert!(trigger.fire());
    }

    #[test]
    fn test_one_time_until_reset() {
        let mut trigger = PlatformTrigger::default().with_one_time(true);
        assert!(trigger.fire());
        assert!(!trigger.fire());
        trigger.reset();
        assert!(trigger.fire());
    }
}
