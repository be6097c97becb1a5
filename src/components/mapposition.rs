//! Parent-local position of an entity.
//!
//! For root entities this is a world position. For entities with a
//! [`ChildOf`](bevy_ecs::hierarchy::ChildOf) parent it is expressed in the
//! parent's space; see [`GlobalTransform2D`] for the resolved world value.

use bevy_ecs::prelude::Component;
use glam::Vec2;

use super::globaltransform2d::GlobalTransform2D;

#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
#[require(GlobalTransform2D)]
pub struct MapPosition {
    pub pos: Vec2,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
        }
    }

    pub fn from_vec(pos: Vec2) -> Self {
        Self { pos }
    }
}
