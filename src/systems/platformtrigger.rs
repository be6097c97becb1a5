//! Tick [`PlatformTrigger`] cooldowns.
use bevy_ecs::prelude::*;

use crate::components::platformtrigger::PlatformTrigger;
use crate::resources::worldtime::WorldTime;

pub fn platform_trigger_cooldown_system(
    mut triggers: Query<&mut PlatformTrigger>,
    time: Res<WorldTime>,
) {
    for mut trigger in triggers.iter_mut() {
        trigger.tick(time.delta);
    }
}
