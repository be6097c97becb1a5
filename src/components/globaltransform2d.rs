//! Computed world-space transform for entities in a hierarchy.
//!
//! When an entity has a [`ChildOf`](bevy_ecs::hierarchy::ChildOf) parent, its
//! [`MapPosition`](super::mapposition::MapPosition), [`Rotation`](super::rotation::Rotation),
//! and [`Scale`](super::scale::Scale) are interpreted as local to the parent.
//! The [`propagate_transforms`](crate::systems::propagate_transforms::propagate_transforms)
//! system computes the resulting world-space values and stores them here.
//!
//! Moving platforms tween in their parent's space, so this type also carries
//! the point/vector conversions between a parent frame and world space.

use bevy_ecs::prelude::*;
use glam::Vec2;

/// Rotate a 2D vector by `angle_degrees` (counter-clockwise).
pub fn rotate(v: Vec2, angle_degrees: f32) -> Vec2 {
    if angle_degrees == 0.0 {
        return v;
    }
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Computed world-space transform for hierarchical entities.
///
/// For root entities it mirrors the local MapPosition/Rotation/Scale.
/// For child entities it contains the composed result of the full ancestor chain.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct GlobalTransform2D {
    /// World-space position.
    pub position: Vec2,
    /// World-space rotation in degrees.
    pub rotation_degrees: f32,
    /// World-space scale.
    pub scale: Vec2,
}

impl Default for GlobalTransform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl GlobalTransform2D {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation_degrees: 0.0,
        scale: Vec2::ONE,
    };

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Map a point expressed in this frame to world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + self.transform_vector(local)
    }

    /// Map a world-space point into this frame.
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        self.inverse_transform_vector(world - self.position)
    }

    /// Map a direction/displacement expressed in this frame to world space.
    pub fn transform_vector(&self, local: Vec2) -> Vec2 {
        rotate(local * self.scale, self.rotation_degrees)
    }

    /// Map a world-space displacement into this frame.
    ///
    /// A zero scale axis collapses that axis to zero instead of dividing by it.
    pub fn inverse_transform_vector(&self, world: Vec2) -> Vec2 {
        let unrotated = rotate(world, -self.rotation_degrees);
        Vec2::new(
            safe_div(unrotated.x, self.scale.x),
            safe_div(unrotated.y, self.scale.y),
        )
    }

    /// Compose a child's local transform onto this frame.
    pub fn compose(&self, local_position: Vec2, local_rotation: f32, local_scale: Vec2) -> Self {
        Self {
            position: self.transform_point(local_position),
            rotation_degrees: self.rotation_degrees + local_rotation,
            scale: self.scale * local_scale,
        }
    }
}

fn safe_div(a: f32, b: f32) -> f32 {
    if b.abs() <= f32::EPSILON { 0.0 } else { a / b }
}
