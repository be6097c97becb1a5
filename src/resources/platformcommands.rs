//! Command queue for moving platforms.
//!
//! Systems, observers and game code that want a platform to do something
//! push a [`PlatformCommand`] here instead of touching the
//! [`MovingPlatform`](crate::components::movingplatform::MovingPlatform)
//! component directly. The platform system drains the queue once per frame,
//! before any platform advances.

use bevy_ecs::prelude::*;

use crate::components::platformconfig::PlatformConfig;
use crate::components::waypoint::WaypointSource;

#[derive(Clone, Debug, PartialEq)]
pub enum PlatformAction {
    Start,
    Stop,
    Pause,
    Resume,
    Trigger,
    Reset,
    SetWaypoints(WaypointSource),
    UpdateConfig(PlatformConfig),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformCommand {
    pub platform: Entity,
    pub action: PlatformAction,
}

#[derive(Resource, Default, Debug)]
pub struct PlatformCommandQueue {
    pending: Vec<PlatformCommand>,
}

impl PlatformCommandQueue {
    pub fn push(&mut self, platform: Entity, action: PlatformAction) {
        self.pending.push(PlatformCommand { platform, action });
    }

    /// Take every queued command, oldest first.
    pub fn drain(&mut self) -> Vec<PlatformCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
