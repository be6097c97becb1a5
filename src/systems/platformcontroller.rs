//! Carry riders along with their platform.
//!
//! Runs on the fixed schedule after rider detection. Each platform's world
//! displacement since the previous tick is added to every tracked rider's
//! [`MapPosition`], converted into the rider's parent space.

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::mapposition::MapPosition;
use crate::components::platformcontroller::PlatformController;

pub fn carry_riders(
    mut platforms: Query<(Entity, &mut PlatformController, &GlobalTransform2D)>,
    mut riders: Query<(&mut MapPosition, Option<&ChildOf>)>,
    frames: Query<&GlobalTransform2D>,
) {
    for (platform, mut controller, transform) in platforms.iter_mut() {
        controller.retain_riders(|rider| riders.contains(rider));
        let Some(delta) = controller.step(transform.position) else {
            continue;
        };
        for &rider in controller.riders() {
            let Ok((mut position, child_of)) = riders.get_mut(rider) else {
                continue;
            };
            let local_delta = match child_of {
                // attached riders already follow the platform
                Some(link) if link.parent() == platform => continue,
                Some(link) => frames
                    .get(link.parent())
                    .map(|frame| frame.inverse_transform_vector(delta))
                    .unwrap_or(delta),
                None => delta,
            };
            position.pos += local_delta;
        }
    }
}
