//! Obstacle checks along a platform's travel segment.
//!
//! The platform's footprint (the world AABB of its [`BoxCollider`]) is swept
//! from the start point toward the end point through a [`PhysicsQuery`]. Every
//! hit is inspected; hits that belong to the platform itself or to its own
//! helpers are discarded and the nearest remaining one blocks.
//!
//! Discarded hits:
//! - the platform and anything parented under it
//! - rider detectors of any platform
//! - the platform's waypoint markers and their descendants
//!
//! [`BoxCollider`]: crate::components::boxcollider::BoxCollider

use bevy_ecs::entity::Entity;
use glam::Vec2;
use log::warn;

/// Segments shorter than this never block.
pub const NEGLIGIBLE_DISTANCE: f32 = 1e-3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CastHit {
    pub entity: Entity,
    /// Travel distance at which the swept box first touches the collider.
    pub distance: f32,
}

/// Collision queries the platform core needs from the host physics.
pub trait PhysicsQuery {
    /// Sweep an axis-aligned box of `size` centered at `center` along the unit
    /// vector `direction` for `distance`. Returns every collider on a layer in
    /// `layer_mask` that the box touches, nearest first. Colliders already
    /// overlapping at the start are reported at distance 0.
    fn box_cast_all(
        &self,
        center: Vec2,
        size: Vec2,
        direction: Vec2,
        distance: f32,
        layer_mask: u32,
    ) -> Vec<CastHit>;

    /// True when `entity` sits anywhere below `ancestor` in the hierarchy.
    fn is_descendant_of(&self, entity: Entity, ancestor: Entity) -> bool;

    fn is_rider_detector(&self, entity: Entity) -> bool;
}

/// World-space box of a platform relative to its pivot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Footprint {
    /// Box center minus platform world position.
    pub center_offset: Vec2,
    pub size: Vec2,
}

pub struct ObstacleDetector<'a> {
    pub physics: &'a dyn PhysicsQuery,
    pub platform: Entity,
    pub markers: &'a [Entity],
    pub layer_mask: u32,
}

impl ObstacleDetector<'_> {
    /// Nearest blocking hit moving the footprint from `start` to `end`.
    pub fn blocking_hit(
        &self,
        footprint: Option<&Footprint>,
        start: Vec2,
        end: Vec2,
    ) -> Option<CastHit> {
        let Some(footprint) = footprint else {
            warn!(
                "Platform {:?} has no collider, obstacle detection skipped",
                self.platform
            );
            return None;
        };
        let offset = end - start;
        let distance = offset.length();
        if distance < NEGLIGIBLE_DISTANCE {
            return None;
        }
        let direction = offset / distance;
        self.physics
            .box_cast_all(
                start + footprint.center_offset,
                footprint.size,
                direction,
                distance,
                self.layer_mask,
            )
            .into_iter()
            .filter(|hit| !self.is_ignored(hit.entity))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn has_obstacle(&self, footprint: Option<&Footprint>, start: Vec2, end: Vec2) -> bool {
        self.blocking_hit(footprint, start, end).is_some()
    }

    fn is_ignored(&self, entity: Entity) -> bool {
        if entity == self.platform || self.physics.is_descendant_of(entity, self.platform) {
            return true;
        }
        if self.physics.is_rider_detector(entity) {
            return true;
        }
        self.markers
            .iter()
            .any(|&m| entity == m || self.physics.is_descendant_of(entity, m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    /// Fixed answers regardless of the cast shape.
    struct ScriptedPhysics {
        hits: Vec<CastHit>,
        parents: Vec<(Entity, Entity)>,
        detectors: Vec<Entity>,
    }

    impl PhysicsQuery for ScriptedPhysics {
        fn box_cast_all(&self, _: Vec2, _: Vec2, _: Vec2, _: f32, _: u32) -> Vec<CastHit> {
            self.hits.clone()
        }

        fn is_descendant_of(&self, entity: Entity, ancestor: Entity) -> bool {
            let mut current = entity;
            while let Some(&(_, parent)) = self.parents.iter().find(|(c, _)| *c == current) {
                if parent == ancestor {
                    return true;
                }
                current = parent;
            }
            false
        }

        fn is_rider_detector(&self, entity: Entity) -> bool {
            self.detectors.contains(&entity)
        }
    }

    const FOOTPRINT: Footprint = Footprint {
        center_offset: Vec2::ZERO,
        size: Vec2::ONE,
    };

    #[test]
    fn test_filters_own_hierarchy_detectors_and_markers() {
        let mut world = World::new();
        let platform = world.spawn_empty().id();
        let child = world.spawn_empty().id();
        let grandchild = world.spawn_empty().id();
        let detector = world.spawn_empty().id();
        let marker = world.spawn_empty().id();
        let marker_child = world.spawn_empty().id();
        let wall = world.spawn_empty().id();

        let physics = ScriptedPhysics {
            hits: vec![
                CastHit { entity: platform, distance: 0.0 },
                CastHit { entity: grandchild, distance: 0.1 },
                CastHit { entity: detector, distance: 0.2 },
                CastHit { entity: marker_child, distance: 0.3 },
                CastHit { entity: wall, distance: 0.9 },
            ],
            parents: vec![(child, platform), (grandchild, child), (marker_child, marker)],
            detectors: vec![detector],
        };
        let markers = [marker];
        let detector_check = ObstacleDetector {
            physics: &physics,
            platform,
            markers: &markers,
            layer_mask: u32::MAX,
        };
        let hit = detector_check.blocking_hit(Some(&FOOTPRINT), Vec2::ZERO, Vec2::new(0.0, -2.0));
        assert_eq!(hit.map(|h| h.entity), Some(wall));
    }

    #[test]
    fn test_negligible_segment_and_missing_footprint_never_block() {
        let mut world = World::new();
        let platform = world.spawn_empty().id();
        let wall = world.spawn_empty().id();
        let physics = ScriptedPhysics {
            hits: vec![CastHit { entity: wall, distance: 0.0 }],
            parents: Vec::new(),
            detectors: Vec::new(),
        };
        let d = ObstacleDetector {
            physics: &physics,
            platform,
            markers: &[],
            layer_mask: u32::MAX,
        };
        assert!(!d.has_obstacle(Some(&FOOTPRINT), Vec2::ZERO, Vec2::new(0.0, 1e-4)));
        assert!(!d.has_obstacle(None, Vec2::ZERO, Vec2::new(0.0, 3.0)));
        assert!(d.has_obstacle(Some(&FOOTPRINT), Vec2::ZERO, Vec2::new(0.0, 3.0)));
    }
}
