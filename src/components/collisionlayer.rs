//! Collision layer membership used to filter shape casts.
//!
//! Layers are bits of a `u32`. A collider without a [`CollisionLayer`] is on
//! [`CollisionLayer::DEFAULT`]. Casts pass a mask and only see colliders
//! whose layer bits intersect it.

use bevy_ecs::prelude::Component;

/// Mask that matches every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    pub const DEFAULT: Self = Self(1);

    /// Layer for a single bit index (0..32).
    pub fn bit(index: u32) -> Self {
        Self(1u32 << index.min(31))
    }

    pub fn matches(&self, mask: u32) -> bool {
        self.0 & mask != 0
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}
