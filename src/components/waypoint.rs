//! Waypoint sets for moving platforms.
//!
//! Waypoints are world-space positions. They come either from anchor
//! entities placed in the level (tagged with [`Waypoint`]) or from literal
//! coordinates. Anchors are looked up every time the set is resolved, so an
//! anchor that moves drags the platform path with it.

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::SmallVec;

use super::mapposition::MapPosition;
use crate::error::PlatformError;

/// Marker for anchor entities used as platform waypoints.
#[derive(Component, Clone, Copy, Debug, Default)]
#[require(MapPosition)]
pub struct Waypoint;

/// Where a platform's waypoints come from.
#[derive(Clone, Debug, PartialEq)]
pub enum WaypointSource {
    /// World positions of anchor entities.
    Anchors(Vec<Entity>),
    /// Literal world coordinates.
    Points(Vec<Vec2>),
}

impl Default for WaypointSource {
    fn default() -> Self {
        WaypointSource::Points(Vec::new())
    }
}

impl WaypointSource {
    pub fn len(&self) -> usize {
        match self {
            WaypointSource::Anchors(a) => a.len(),
            WaypointSource::Points(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Anchor entities, which also count as the platform's waypoint markers.
    pub fn markers(&self) -> SmallVec<[Entity; 4]> {
        match self {
            WaypointSource::Anchors(a) => a.iter().copied().collect(),
            WaypointSource::Points(_) => SmallVec::new(),
        }
    }

    /// Resolve to world positions.
    ///
    /// Fails with [`PlatformError::NotEnoughWaypoints`] below two entries and
    /// with [`PlatformError::UnresolvedWaypoint`] for the first anchor that
    /// has no position.
    pub fn resolve(
        &self,
        lookup: &dyn Fn(Entity) -> Option<Vec2>,
    ) -> Result<SmallVec<[Vec2; 4]>, PlatformError> {
        if self.len() < 2 {
            return Err(PlatformError::NotEnoughWaypoints(self.len()));
        }
        match self {
            WaypointSource::Points(p) => Ok(p.iter().copied().collect()),
            WaypointSource::Anchors(anchors) => anchors
                .iter()
                .map(|&e| lookup(e).ok_or(PlatformError::UnresolvedWaypoint(e)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_anchors(_: Entity) -> Option<Vec2> {
        None
    }

    #[test]
    fn test_points_resolve_as_is() {
        let src = WaypointSource::Points(vec![Vec2::ZERO, Vec2::new(1.0, 2.0)]);
        let wps = src.resolve(&no_anchors).unwrap();
        assert_eq!(wps.as_slice(), &[Vec2::ZERO, Vec2::new(1.0, 2.0)]);
        assert!(src.markers().is_empty());
    }

    #[test]
    fn test_too_few_waypoints() {
        let src = WaypointSource::Points(vec![Vec2::ZERO]);
        assert_eq!(
            src.resolve(&no_anchors),
            Err(PlatformError::NotEnoughWaypoints(1))
        );
    }

    #[test]
    fn test_missing_anchor_fails() {
        let mut world = World::new();
        let a = world.spawn(Waypoint).id();
        let b = world.spawn(Waypoint).id();
        let src = WaypointSource::Anchors(vec![a, b]);
        let lookup = |e: Entity| if e == a { Some(Vec2::ONE) } else { None };
        assert_eq!(src.resolve(&lookup), Err(PlatformError::UnresolvedWaypoint(b)));
        assert_eq!(src.markers().as_slice(), &[a, b]);
    }
}
