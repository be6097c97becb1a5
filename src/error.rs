//! Errors reported by moving platform operations.

use std::fmt;

use bevy_ecs::entity::Entity;

use crate::components::platformconfig::MovementKind;

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// Fewer than two waypoints were supplied.
    NotEnoughWaypoints(usize),
    /// An anchor entity has no world position (despawned or missing transform).
    UnresolvedWaypoint(Entity),
    /// `move_speed` is zero, negative or not finite.
    InvalidSpeed(f32),
    /// The strategy needs an exact waypoint count.
    WrongWaypointCount { expected: usize, found: usize },
    /// The operation only applies to another movement kind.
    WrongKind {
        expected: MovementKind,
        actual: MovementKind,
    },
    /// The platform has not been initialized yet.
    NotInitialized,
    /// Config could not be parsed or loaded.
    Config(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::NotEnoughWaypoints(n) => {
                write!(f, "at least 2 waypoints are required, got {}", n)
            }
            PlatformError::UnresolvedWaypoint(e) => {
                write!(f, "waypoint anchor {:?} does not resolve to a position", e)
            }
            PlatformError::InvalidSpeed(s) => write!(f, "move speed must be > 0, got {}", s),
            PlatformError::WrongWaypointCount { expected, found } => {
                write!(f, "expected exactly {} waypoints, got {}", expected, found)
            }
            PlatformError::WrongKind { expected, actual } => write!(
                f,
                "operation requires a {:?} platform, this one is {:?}",
                expected, actual
            ),
            PlatformError::NotInitialized => write!(f, "platform is not initialized"),
            PlatformError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}
