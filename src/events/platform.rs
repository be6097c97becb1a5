//! Event kinds and payloads exchanged over the
//! [`EventBus`](crate::resources::eventbus::EventBus).
//!
//! Platforms publish [`EventKind::PlatformStartMove`] and
//! [`EventKind::PlatformStopMove`] when a tween begins or ends, and their
//! controllers publish [`EventKind::RiderOn`] / [`EventKind::RiderOff`] as
//! riders step on and off. [`EventKind::PlatformTrigger`] flows the other
//! way: whoever publishes it with a [`EventPayload::Platform`] payload asks
//! that Trigger platform to move.

use bevy_ecs::entity::Entity;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlatformTrigger,
    PlatformStartMove,
    PlatformStopMove,
    RiderOn,
    RiderOff,
    /// Game-defined kinds outside the platform core.
    Custom(&'static str),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventPayload {
    Platform(Entity),
    Rider { platform: Entity, rider: Entity },
}

impl EventPayload {
    /// Platform the payload refers to.
    pub fn platform(&self) -> Entity {
        match self {
            EventPayload::Platform(p) => *p,
            EventPayload::Rider { platform, .. } => *platform,
        }
    }
}
