//! Tunable parameters of a moving platform.
//!
//! A [`PlatformConfig`] is a plain value carried by the
//! [`MovingPlatform`](super::movingplatform::MovingPlatform) component. The
//! movement strategies read the fields relevant to their kind and ignore the
//! rest. Configs can be written in JSON (serde) or in an INI section, see
//! [`load_platform_config`](crate::resources::platformsettings::load_platform_config).
//!
//! ```json
//! { "movement_kind": "Trigger", "move_speed": 3.0, "return_to_start": true }
//! ```

use serde::{Deserialize, Serialize};

use super::collisionlayer::ALL_LAYERS;
use super::tween::Easing;
use crate::error::PlatformError;

/// Which strategy drives the platform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Endless travel along the waypoints.
    #[default]
    Loop,
    /// Moves only when activated.
    Trigger,
    /// Slides between two waypoints following world gravity.
    Gravity,
}

impl MovementKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "loop" => Some(MovementKind::Loop),
            "trigger" => Some(MovementKind::Trigger),
            "gravity" => Some(MovementKind::Gravity),
            _ => None,
        }
    }
}

/// How far a single activation moves a Trigger platform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Advance to the next waypoint.
    #[default]
    SinglePath,
    /// Travel the whole waypoint sequence.
    FullPath,
}

impl TriggerMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "singlepath" | "single" => Some(TriggerMode::SinglePath),
            "fullpath" | "full" => Some(TriggerMode::FullPath),
            _ => None,
        }
    }
}

/// Platform parameters. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub movement_kind: MovementKind,
    /// Units per second.
    pub move_speed: f32,
    pub easing: Easing,
    /// Seconds before the first Loop tween or before each Trigger tween.
    pub initial_delay: f32,
    /// Loop dwell at each end of the path.
    pub wait_time_at_waypoint: f32,
    /// Loop: Yoyo when true, Restart when false.
    pub reverse_on_complete: bool,
    /// Loop/Restart: return to the first waypoint before restarting.
    pub close_path: bool,
    pub trigger_mode: TriggerMode,
    pub can_trigger_multiple_times: bool,
    pub trigger_cooldown: f32,
    pub return_to_start: bool,
    pub obstacle_check_distance: f32,
    pub gravity_check_interval: f32,
    /// Degrees.
    pub gravity_tolerance: f32,
    pub obstacle_layers: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            movement_kind: MovementKind::Loop,
            move_speed: 2.0,
            easing: Easing::Linear,
            initial_delay: 0.0,
            wait_time_at_waypoint: 0.0,
            reverse_on_complete: true,
            close_path: true,
            trigger_mode: TriggerMode::SinglePath,
            can_trigger_multiple_times: true,
            trigger_cooldown: 1.0,
            return_to_start: false,
            obstacle_check_distance: 0.5,
            gravity_check_interval: 0.1,
            gravity_tolerance: 45.0,
            obstacle_layers: ALL_LAYERS,
        }
    }
}

impl PlatformConfig {
    /// Default config for a given movement kind.
    pub fn of_kind(kind: MovementKind) -> Self {
        Self {
            movement_kind: kind,
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Reject values no strategy can run with.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if !(self.move_speed.is_finite() && self.move_speed > 0.0) {
            return Err(PlatformError::InvalidSpeed(self.move_speed));
        }
        Ok(())
    }

    /// Parse and validate a config from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, PlatformError> {
        let config: PlatformConfig =
            serde_json::from_str(json).map_err(|e| PlatformError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, PlatformError> {
        serde_json::to_string_pretty(self).map_err(|e| PlatformError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = PlatformConfig::default();
        assert_eq!(c.movement_kind, MovementKind::Loop);
        assert_eq!(c.move_speed, 2.0);
        assert!(c.reverse_on_complete);
        assert!(c.close_path);
        assert_eq!(c.trigger_cooldown, 1.0);
        assert_eq!(c.gravity_tolerance, 45.0);
        assert_eq!(c.obstacle_layers, ALL_LAYERS);
    }

    #[test]
    fn test_json_partial_fields_use_defaults() {
        let c = PlatformConfig::from_json_str(
            r#"{ "movement_kind": "Trigger", "move_speed": 3.5, "easing": "QuadOut" }"#,
        )
        .unwrap();
        assert_eq!(c.movement_kind, MovementKind::Trigger);
        assert_eq!(c.move_speed, 3.5);
        assert_eq!(c.easing, Easing::QuadOut);
        assert_eq!(c.trigger_mode, TriggerMode::SinglePath);
    }

    #[test]
    fn test_json_rejects_bad_speed() {
        let err = PlatformConfig::from_json_str(r#"{ "move_speed": 0.0 }"#).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidSpeed(_)));
    }

    #[test]
    fn test_json_rejects_garbage() {
        let err = PlatformConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let c = PlatformConfig::of_kind(MovementKind::Gravity).with_speed(4.0);
        let json = c.to_json_string().unwrap();
        assert_eq!(PlatformConfig::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MovementKind::from_name("Gravity"), Some(MovementKind::Gravity));
        assert_eq!(TriggerMode::from_name("full"), Some(TriggerMode::FullPath));
        assert_eq!(MovementKind::from_name("orbit"), None);
    }
}
