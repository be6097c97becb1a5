//! Transform propagation for parent-child entity hierarchies.
//!
//! Computes [`GlobalTransform2D`] for every entity with a [`MapPosition`]:
//! roots take their local transform as is, descendants compose it with their
//! parent's world transform.
//!
//! # Schedule position
//!
//! Runs before the collider world is rebuilt and again after the platform
//! system and rider carry, so every consumer sees up-to-date world positions.

use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::mapposition::MapPosition;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;

type LocalTransform<'a> = (
    &'a MapPosition,
    Option<&'a Rotation>,
    Option<&'a Scale>,
    Option<&'a Children>,
);

/// Propagate transforms from roots down through the hierarchy.
///
/// Entities missing a `GlobalTransform2D` get it inserted via deferred
/// [`Commands`] (visible after the schedule applies them).
pub fn propagate_transforms(
    roots: Query<(Entity, LocalTransform), Without<ChildOf>>,
    children_query: Query<LocalTransform, With<ChildOf>>,
    mut globals: Query<&mut GlobalTransform2D>,
    mut commands: Commands,
) {
    for (root_entity, (pos, rot, scale, children)) in roots.iter() {
        let root_gt = GlobalTransform2D::IDENTITY.compose(
            pos.pos,
            rot.map(|r| r.degrees).unwrap_or(0.0),
            scale.map(|s| s.scale).unwrap_or(Vec2::ONE),
        );
        write_global(root_entity, root_gt, &mut globals, &mut commands);

        if let Some(children) = children {
            propagate_children(
                &root_gt,
                children,
                &children_query,
                &mut globals,
                &mut commands,
            );
        }
    }
}

fn write_global(
    entity: Entity,
    value: GlobalTransform2D,
    globals: &mut Query<&mut GlobalTransform2D>,
    commands: &mut Commands,
) {
    if let Ok(mut gt) = globals.get_mut(entity) {
        *gt = value;
    } else {
        commands.entity(entity).insert(value);
    }
}

fn propagate_children(
    parent_gt: &GlobalTransform2D,
    children: &Children,
    children_query: &Query<LocalTransform, With<ChildOf>>,
    globals: &mut Query<&mut GlobalTransform2D>,
    commands: &mut Commands,
) {
    for child_entity in children.iter() {
        let Ok((pos, rot, scale, grandchildren)) = children_query.get(child_entity) else {
            continue;
        };
        let child_gt = parent_gt.compose(
            pos.pos,
            rot.map(|r| r.degrees).unwrap_or(0.0),
            scale.map(|s| s.scale).unwrap_or(Vec2::ONE),
        );
        write_global(child_entity, child_gt, globals, commands);

        if let Some(grandchildren) = grandchildren {
            propagate_children(&child_gt, grandchildren, children_query, globals, commands);
        }
    }
}
