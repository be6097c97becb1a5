//! Overlap sensor that tells a platform who is standing on it.
//!
//! A [`RiderDetector`] lives on a child of the platform with its own
//! [`BoxCollider`](super::boxcollider::BoxCollider), usually a thin strip
//! just above the platform surface. Entities tagged [`Rider`] whose collider
//! overlaps the strip are riders.

use bevy_ecs::prelude::*;
use smallvec::SmallVec;

use super::mapposition::MapPosition;

#[derive(Component, Clone, Debug)]
#[require(MapPosition)]
pub struct RiderDetector {
    /// Platform whose controller receives enter/exit notifications.
    pub platform: Entity,
    /// Riders overlapping on the previous fixed tick.
    pub overlapping: SmallVec<[Entity; 4]>,
}

impl RiderDetector {
    pub fn new(platform: Entity) -> Self {
        RiderDetector {
            platform,
            overlapping: SmallVec::new(),
        }
    }
}

/// Marker for entities that can ride platforms.
#[derive(Component, Clone, Copy, Debug, Default)]
#[require(MapPosition)]
pub struct Rider;
