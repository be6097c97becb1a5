//! Platform settings resource.
//!
//! Holds the simulation step, the rider carry threshold, world gravity and
//! named platform configs. Everything has a default so the simulation runs
//! without a file.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_timestep = 0.02
//! carry_threshold = 0.001
//!
//! [gravity]
//! x = 0.0
//! y = -1.0
//!
//! ; defaults shared by every [platform.*] section
//! [platforms]
//! move_speed = 2.5
//!
//! [platform.lift]
//! kind = trigger
//! trigger_mode = fullpath
//! return_to_start = true
//! easing = quadinout
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::info;
use rustc_hash::FxHashMap;

use crate::components::platformconfig::{MovementKind, PlatformConfig, TriggerMode};
use crate::components::platformcontroller::DEFAULT_CARRY_THRESHOLD;
use crate::components::tween::Easing;
use crate::error::PlatformError;

const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 50.0;
const DEFAULT_CONFIG_PATH: &str = "./platforms.ini";
const PLATFORM_SECTION_PREFIX: &str = "platform.";

#[derive(Resource, Debug, Clone)]
pub struct PlatformSettings {
    /// Seconds per fixed tick.
    pub fixed_timestep: f32,
    pub carry_threshold: f32,
    pub gravity: Vec2,
    /// Named configs from `[platform.<name>]` sections.
    pub platforms: FxHashMap<String, PlatformConfig>,
    pub config_path: PathBuf,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformSettings {
    pub fn new() -> Self {
        Self {
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            carry_threshold: DEFAULT_CARRY_THRESHOLD,
            gravity: Vec2::NEG_Y,
            platforms: FxHashMap::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Named config, or the default config when `name` is unknown.
    pub fn platform(&self, name: &str) -> PlatformConfig {
        self.platforms.get(name).cloned().unwrap_or_default()
    }

    /// Load settings from the INI file. Missing values keep their current
    /// value.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut ini = Ini::new();
        ini.load(&self.config_path)
            .map_err(|e| format!("Failed to load platform settings: {}", e))?;
        self.apply(&ini)
    }

    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut ini = Ini::new();
        ini.read(text.to_string())
            .map_err(|e| format!("Failed to parse platform settings: {}", e))?;
        self.apply(&ini)
    }

    fn apply(&mut self, ini: &Ini) -> Result<(), String> {
        // [simulation] section
        if let Some(step) = ini.getfloat("simulation", "fixed_timestep").ok().flatten()
            && step > 0.0
        {
            self.fixed_timestep = step as f32;
        }
        if let Some(threshold) = ini.getfloat("simulation", "carry_threshold").ok().flatten() {
            self.carry_threshold = (threshold as f32).max(0.0);
        }

        // [gravity] section
        let x = ini.getfloat("gravity", "x").ok().flatten();
        let y = ini.getfloat("gravity", "y").ok().flatten();
        if x.is_some() || y.is_some() {
            let gravity = Vec2::new(
                x.map(|v| v as f32).unwrap_or(self.gravity.x),
                y.map(|v| v as f32).unwrap_or(self.gravity.y),
            );
            if gravity.length_squared() > 0.0 {
                self.gravity = gravity.normalize();
            }
        }

        // [platforms] defaults, then [platform.<name>] sections
        let base = load_platform_config(ini, "platforms", &PlatformConfig::default())
            .map_err(|e| e.to_string())?;
        for section in ini.sections() {
            let Some(name) = section.strip_prefix(PLATFORM_SECTION_PREFIX) else {
                continue;
            };
            let config = load_platform_config(ini, &section, &base).map_err(|e| e.to_string())?;
            self.platforms.insert(name.to_string(), config);
        }

        info!(
            "Loaded platform settings: step={:.4}, carry_threshold={}, gravity=({:.2}, {:.2}), {} platform configs",
            self.fixed_timestep,
            self.carry_threshold,
            self.gravity.x,
            self.gravity.y,
            self.platforms.len()
        );
        Ok(())
    }
}

fn float(ini: &Ini, section: &str, key: &str) -> Result<Option<f32>, PlatformError> {
    ini.getfloat(section, key)
        .map(|v| v.map(|v| v as f32))
        .map_err(|e| PlatformError::Config(format!("[{}] {}: {}", section, key, e)))
}

fn flag(ini: &Ini, section: &str, key: &str) -> Result<Option<bool>, PlatformError> {
    ini.getbool(section, key)
        .map_err(|e| PlatformError::Config(format!("[{}] {}: {}", section, key, e)))
}

fn named<T>(
    ini: &Ini,
    section: &str,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, PlatformError> {
    match ini.get(section, key) {
        None => Ok(None),
        Some(value) => parse(&value).map(Some).ok_or_else(|| {
            PlatformError::Config(format!("[{}] {}: unknown value '{}'", section, key, value))
        }),
    }
}

/// Read a platform config from `section`, starting from `base`.
///
/// Keys match the [`PlatformConfig`] field names; `kind` is accepted as a
/// short form of `movement_kind`. The result is validated.
pub fn load_platform_config(
    ini: &Ini,
    section: &str,
    base: &PlatformConfig,
) -> Result<PlatformConfig, PlatformError> {
    let mut config = base.clone();

    let kind = match named(ini, section, "kind", MovementKind::from_name)? {
        Some(kind) => Some(kind),
        None => named(ini, section, "movement_kind", MovementKind::from_name)?,
    };
    if let Some(kind) = kind {
        config.movement_kind = kind;
    }
    if let Some(easing) = named(ini, section, "easing", Easing::from_name)? {
        config.easing = easing;
    }
    if let Some(mode) = named(ini, section, "trigger_mode", TriggerMode::from_name)? {
        config.trigger_mode = mode;
    }

    let floats: [(&str, &mut f32); 7] = [
        ("move_speed", &mut config.move_speed),
        ("initial_delay", &mut config.initial_delay),
        ("wait_time_at_waypoint", &mut config.wait_time_at_waypoint),
        ("trigger_cooldown", &mut config.trigger_cooldown),
        ("obstacle_check_distance", &mut config.obstacle_check_distance),
        ("gravity_check_interval", &mut config.gravity_check_interval),
        ("gravity_tolerance", &mut config.gravity_tolerance),
    ];
    for (key, field) in floats {
        if let Some(value) = float(ini, section, key)? {
            *field = value;
        }
    }

    let flags: [(&str, &mut bool); 4] = [
        ("reverse_on_complete", &mut config.reverse_on_complete),
        ("close_path", &mut config.close_path),
        ("can_trigger_multiple_times", &mut config.can_trigger_multiple_times),
        ("return_to_start", &mut config.return_to_start),
    ];
    for (key, field) in flags {
        if let Some(value) = flag(ini, section, key)? {
            *field = value;
        }
    }

    if let Some(layers) = ini
        .getuint(section, "obstacle_layers")
        .map_err(|e| PlatformError::Config(format!("[{}] obstacle_layers: {}", section, e)))?
    {
        config.obstacle_layers = layers as u32;
    }

    config.validate()?;
    Ok(config)
}
