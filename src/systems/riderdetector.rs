//! Rider membership from detector overlaps.
//!
//! Every fixed tick each [`RiderDetector`] compares the [`Rider`] colliders
//! overlapping it now with the set from the previous tick and reports the
//! difference to its platform's [`PlatformController`].

use bevy_ecs::prelude::*;
use log::warn;
use smallvec::SmallVec;

use crate::components::boxcollider::{BoxCollider, aabb_overlap};
use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::platformcontroller::PlatformController;
use crate::components::riderdetector::{Rider, RiderDetector};
use crate::resources::eventbus::EventBus;

pub fn rider_detection_system(
    mut detectors: Query<(&mut RiderDetector, &BoxCollider, &GlobalTransform2D)>,
    riders: Query<(Entity, &BoxCollider, &GlobalTransform2D), With<Rider>>,
    mut controllers: Query<&mut PlatformController>,
    mut bus: ResMut<EventBus>,
) {
    for (mut detector, collider, transform) in detectors.iter_mut() {
        let platform = detector.platform;
        let (min, max) = collider.world_bounds(transform);
        let current: SmallVec<[Entity; 4]> = riders
            .iter()
            .filter(|(rider, ..)| *rider != platform)
            .filter(|(_, rider_collider, rider_transform)| {
                let (rider_min, rider_max) = rider_collider.world_bounds(rider_transform);
                aabb_overlap(min, max, rider_min, rider_max)
            })
            .map(|(rider, ..)| rider)
            .collect();

        let Ok(mut controller) = controllers.get_mut(platform) else {
            warn!("Rider detector points at {:?} which has no PlatformController", platform);
            detector.overlapping = current;
            continue;
        };
        for &rider in detector.overlapping.iter() {
            if !current.contains(&rider) {
                controller.on_rider_exit(platform, rider, &mut bus);
            }
        }
        for &rider in current.iter() {
            if !detector.overlapping.contains(&rider) {
                controller.on_rider_enter(platform, rider, &mut bus);
            }
        }
        detector.overlapping = current;
    }
}
