//! Snapshot of collider bounds used for platform obstacle queries.
//!
//! [`ColliderWorld`] is rebuilt once per frame by
//! [`rebuild_collider_world`](crate::systems::collisionworld::rebuild_collider_world)
//! from every entity carrying a [`BoxCollider`](crate::components::boxcollider::BoxCollider)
//! and a [`GlobalTransform2D`](crate::components::globaltransform2d::GlobalTransform2D).
//! It answers [`PhysicsQuery`] box casts with a swept-AABB test and keeps the
//! parent links needed for hierarchy filtering.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::movement::obstacle::{CastHit, PhysicsQuery};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderEntry {
    pub entity: Entity,
    pub min: Vec2,
    pub max: Vec2,
    pub layer: u32,
}

#[derive(Resource, Default, Debug)]
pub struct ColliderWorld {
    entries: Vec<ColliderEntry>,
    parents: FxHashMap<Entity, Entity>,
    rider_detectors: FxHashSet<Entity>,
}

impl ColliderWorld {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.parents.clear();
        self.rider_detectors.clear();
    }

    pub fn insert_collider(&mut self, entity: Entity, min: Vec2, max: Vec2, layer: u32) {
        self.entries.push(ColliderEntry {
            entity,
            min,
            max,
            layer,
        });
    }

    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        self.parents.insert(child, parent);
    }

    pub fn mark_rider_detector(&mut self, entity: Entity) {
        self.rider_detectors.insert(entity);
    }

    pub fn entries(&self) -> &[ColliderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Entry and exit travel distances of a ray against an AABB, slab method.
fn ray_aabb(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], direction[axis], min[axis], max[axis]);
        if d.abs() <= f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }
    (t_enter <= t_exit).then_some((t_enter, t_exit))
}

impl PhysicsQuery for ColliderWorld {
    fn box_cast_all(
        &self,
        center: Vec2,
        size: Vec2,
        direction: Vec2,
        distance: f32,
        layer_mask: u32,
    ) -> Vec<CastHit> {
        let half = size.abs() * 0.5;
        let mut hits: Vec<CastHit> = self
            .entries
            .iter()
            .filter(|e| e.layer & layer_mask != 0)
            .filter_map(|e| {
                // sweep a point against the collider grown by the box extents
                let grown_min = e.min - half;
                let grown_max = e.max + half;
                let inside = center.x > grown_min.x
                    && center.x < grown_max.x
                    && center.y > grown_min.y
                    && center.y < grown_max.y;
                if inside {
                    return Some(CastHit {
                        entity: e.entity,
                        distance: 0.0,
                    });
                }
                let (t_enter, t_exit) = ray_aabb(center, direction, grown_min, grown_max)?;
                (t_exit > 0.0 && t_enter >= 0.0 && t_enter <= distance).then_some(CastHit {
                    entity: e.entity,
                    distance: t_enter,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn is_descendant_of(&self, entity: Entity, ancestor: Entity) -> bool {
        let mut current = entity;
        // depth guard against malformed cycles
        for _ in 0..256 {
            match self.parents.get(&current) {
                Some(&parent) if parent == ancestor => return true,
                Some(&parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn is_rider_detector(&self, entity: Entity) -> bool {
        self.rider_detectors.contains(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_cast_hits_sorted_with_distance() {
        let e = entities(3);
        let mut cw = ColliderWorld::default();
        // unit box moving down from y=0; walls below at y=-3 and y=-6
        cw.insert_collider(e[0], Vec2::new(-1.0, -7.0), Vec2::new(1.0, -6.0), 1);
        cw.insert_collider(e[1], Vec2::new(-1.0, -4.0), Vec2::new(1.0, -3.0), 1);
        cw.insert_collider(e[2], Vec2::new(5.0, -4.0), Vec2::new(6.0, -3.0), 1);
        let hits = cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::NEG_Y, 10.0, u32::MAX);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, e[1]);
        assert!(approx_eq(hits[0].distance, 2.5));
        assert_eq!(hits[1].entity, e[0]);
        assert!(approx_eq(hits[1].distance, 5.5));
    }

    #[test]
    fn test_cast_respects_distance_and_layers() {
        let e = entities(1);
        let mut cw = ColliderWorld::default();
        cw.insert_collider(e[0], Vec2::new(-1.0, -4.0), Vec2::new(1.0, -3.0), 0b10);
        assert!(
            cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::NEG_Y, 2.0, u32::MAX)
                .is_empty()
        );
        assert!(
            cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::NEG_Y, 10.0, 0b01)
                .is_empty()
        );
        assert_eq!(
            cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::NEG_Y, 10.0, 0b10)
                .len(),
            1
        );
    }

    #[test]
    fn test_initial_overlap_reports_zero() {
        let e = entities(1);
        let mut cw = ColliderWorld::default();
        cw.insert_collider(e[0], Vec2::new(-0.2, -0.2), Vec2::new(0.2, 0.2), 1);
        let hits = cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::X, 1.0, u32::MAX);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_moving_away_does_not_hit() {
        let e = entities(1);
        let mut cw = ColliderWorld::default();
        cw.insert_collider(e[0], Vec2::new(-1.0, 2.0), Vec2::new(1.0, 3.0), 1);
        assert!(
            cw.box_cast_all(Vec2::ZERO, Vec2::ONE, Vec2::NEG_Y, 10.0, u32::MAX)
                .is_empty()
        );
    }

    #[test]
    fn test_hierarchy_and_detector_queries() {
        let e = entities(4);
        let mut cw = ColliderWorld::default();
        cw.set_parent(e[1], e[0]);
        cw.set_parent(e[2], e[1]);
        cw.mark_rider_detector(e[3]);
        assert!(cw.is_descendant_of(e[2], e[0]));
        assert!(!cw.is_descendant_of(e[0], e[2]));
        assert!(!cw.is_descendant_of(e[3], e[0]));
        assert!(cw.is_rider_detector(e[3]));
    }
}
