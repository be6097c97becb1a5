//! Level rotation state and world gravity.
//!
//! [`LevelRotation`] is written only by whatever rotates the level (a
//! cutscene driver, the demo scenario, a test) and read by the platform
//! system, which copies it into the
//! [`WorldState`](crate::movement::WorldState) handed to every strategy.
//! [`WorldGravity`] is the fixed world "down" used by Gravity platforms; it
//! does not follow the level rotation.

use bevy_ecs::prelude::Resource;
use glam::Vec2;

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct LevelRotation {
    in_rotation: bool,
    progress: f32,
}

impl LevelRotation {
    pub fn begin(&mut self) {
        self.in_rotation = true;
        self.progress = 0.0;
    }

    /// Progress of the running rotation, clamped to 0..=1.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn finish(&mut self) {
        self.in_rotation = false;
        self.progress = 1.0;
    }

    pub fn is_rotating(&self) -> bool {
        self.in_rotation
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}

#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldGravity(pub Vec2);

impl Default for WorldGravity {
    fn default() -> Self {
        WorldGravity(Vec2::NEG_Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_lifecycle() {
        let mut r = LevelRotation::default();
        assert!(!r.is_rotating());
        r.begin();
        assert!(r.is_rotating());
        r.set_progress(1.5);
        assert_eq!(r.progress(), 1.0);
        r.finish();
        assert!(!r.is_rotating());
    }

    #[test]
    fn test_gravity_points_down() {
        assert_eq!(WorldGravity::default().0, Vec2::new(0.0, -1.0));
    }
}
