//! Rebuild the [`ColliderWorld`] snapshot from the ECS.
//!
//! Runs once per frame after transform propagation so obstacle probes made by
//! the platform system see this frame's collider positions.

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;

use crate::components::boxcollider::BoxCollider;
use crate::components::collisionlayer::CollisionLayer;
use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::riderdetector::RiderDetector;
use crate::resources::collisionworld::ColliderWorld;

pub fn rebuild_collider_world(
    mut colliders: ResMut<ColliderWorld>,
    links: Query<(Entity, &ChildOf)>,
    shapes: Query<(
        Entity,
        &BoxCollider,
        &GlobalTransform2D,
        Option<&CollisionLayer>,
        Has<RiderDetector>,
    )>,
) {
    colliders.clear();
    for (entity, child_of) in links.iter() {
        colliders.set_parent(entity, child_of.parent());
    }
    for (entity, collider, transform, layer, is_detector) in shapes.iter() {
        let (min, max) = collider.world_bounds(transform);
        let layer = layer.copied().unwrap_or_default();
        colliders.insert_collider(entity, min, max, layer.0);
        if is_detector {
            colliders.mark_rider_detector(entity);
        }
    }
}
