//! Event and observer for level triggers that drive Trigger platforms.
//!
//! Emitting a [`PlatformTriggerEvent`] for an entity with a
//! [`PlatformTrigger`] queues [`PlatformAction::Trigger`] for every target.
//! The commands are applied by the platform system on its next run.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::platformtrigger::PlatformTrigger;
use crate::resources::platformcommands::{PlatformAction, PlatformCommandQueue};

#[derive(Event, Debug, Clone, Copy)]
pub struct PlatformTriggerEvent {
    /// Entity carrying the [`PlatformTrigger`].
    pub trigger: Entity,
}

pub fn observe_platform_trigger(
    trigger: On<PlatformTriggerEvent>,
    mut triggers: Query<&mut PlatformTrigger>,
    mut queue: ResMut<PlatformCommandQueue>,
) {
    let source = trigger.event().trigger;
    let Ok(mut platform_trigger) = triggers.get_mut(source) else {
        warn!("PlatformTriggerEvent for {:?} without PlatformTrigger", source);
        return;
    };
    if !platform_trigger.fire() {
        debug!("Platform trigger {:?} is not ready", source);
        return;
    }
    for &target in &platform_trigger.targets {
        queue.push(target, PlatformAction::Trigger);
    }
    debug!(
        "Platform trigger {:?} fired for {} platforms",
        source,
        platform_trigger.targets.len()
    );
}
