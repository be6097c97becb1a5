//! FlashParty platforms headless simulator.
//!
//! Runs scripted moving platform scenarios on a bare ECS world and logs what
//! the platforms do:
//!
//! - **loop** – a three-waypoint Loop platform carrying a rider
//! - **trigger** – a FullPath Trigger platform fired by a level trigger
//! - **gravity** – a Gravity platform inside a level that is turned upside down
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --scenario gravity --seconds 12
//! ```

use std::path::{Path, PathBuf};

use bevy_ecs::hierarchy::ChildOf;
use bevy_ecs::prelude::*;
use clap::{Parser, ValueEnum};
use glam::Vec2;
use log::{error, info, warn};

use flashparty_platforms::components::boxcollider::BoxCollider;
use flashparty_platforms::components::globaltransform2d::GlobalTransform2D;
use flashparty_platforms::components::mapposition::MapPosition;
use flashparty_platforms::components::movingplatform::MovingPlatform;
use flashparty_platforms::components::platformconfig::{MovementKind, PlatformConfig, TriggerMode};
use flashparty_platforms::components::platformtrigger::PlatformTrigger;
use flashparty_platforms::components::riderdetector::Rider;
use flashparty_platforms::components::rotation::Rotation;
use flashparty_platforms::components::waypoint::{Waypoint, WaypointSource};
use flashparty_platforms::events::platform::EventKind;
use flashparty_platforms::events::platformtrigger::PlatformTriggerEvent;
use flashparty_platforms::game::{
    build_fixed_schedule, build_update_schedule, run_frame, setup_world, spawn_moving_platform,
    teardown,
};
use flashparty_platforms::resources::eventbus::EventBus;
use flashparty_platforms::resources::levelrotation::LevelRotation;
use flashparty_platforms::resources::platformsettings::PlatformSettings;
use flashparty_platforms::resources::worldtime::WorldTime;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Loop,
    Trigger,
    Gravity,
    All,
}

/// FlashParty moving platform simulator
#[derive(Parser)]
#[command(version, about = "Headless moving platform simulation")]
struct Cli {
    /// INI file with simulation settings and named platform configs.
    #[arg(long, value_name = "PATH", default_value = "./platforms.ini")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Simulated seconds per scenario.
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,

    /// Frame delta in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON platform config used for every demo platform. The movement kind
    /// of each scenario is kept.
    #[arg(long, value_name = "PATH")]
    platform_config: Option<PathBuf>,
}

/// Something the script does at a given simulated time.
enum Cue {
    Fire { at: f32, trigger: Entity },
    Spin { at: f32, level: Entity, degrees: f32, duration: f32 },
}

impl Cue {
    fn at(&self) -> f32 {
        match self {
            Cue::Fire { at, .. } | Cue::Spin { at, .. } => *at,
        }
    }
}

/// Level rotation in progress.
struct Spin {
    level: Entity,
    started: f32,
    from: f32,
    to: f32,
    duration: f32,
}

fn load_json_config(path: &Path) -> Result<PlatformConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    PlatformConfig::from_json_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn scenario_config(
    settings: &PlatformSettings,
    name: &str,
    kind: MovementKind,
    custom: Option<&PlatformConfig>,
) -> PlatformConfig {
    let mut config = custom.cloned().unwrap_or_else(|| settings.platform(name));
    config.movement_kind = kind;
    config
}

fn log_bus_events(world: &mut World) {
    let mut bus = world.resource_mut::<EventBus>();
    for (kind, label) in [
        (EventKind::PlatformStartMove, "start move"),
        (EventKind::PlatformStopMove, "stop move"),
        (EventKind::RiderOn, "rider on"),
        (EventKind::RiderOff, "rider off"),
    ] {
        bus.subscribe(
            kind,
            Box::new(move |_, payload| {
                if let Some(payload) = payload {
                    info!("  [{}] {:?}", label, payload);
                }
            }),
        );
    }
}

fn build_loop(world: &mut World, config: PlatformConfig) -> Vec<Cue> {
    let waypoints = WaypointSource::Points(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(6.0, 0.0),
        Vec2::new(6.0, 4.0),
    ]);
    let platform = spawn_moving_platform(
        world,
        MovingPlatform::new(config, waypoints),
        Vec2::ZERO,
        Vec2::new(3.0, 0.5),
    );
    world.spawn((
        Rider,
        MapPosition::new(0.0, 0.6),
        BoxCollider::centered(0.8, 0.8),
    ));
    info!("Loop platform {:?} with a rider on board", platform);
    Vec::new()
}

fn build_trigger(world: &mut World, config: PlatformConfig) -> Vec<Cue> {
    let anchors: Vec<Entity> = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0), Vec2::new(4.0, 5.0)]
        .into_iter()
        .map(|p| world.spawn((Waypoint, MapPosition::from_vec(p))).id())
        .collect();
    let platform = spawn_moving_platform(
        world,
        MovingPlatform::new(config, WaypointSource::Anchors(anchors)),
        Vec2::ZERO,
        Vec2::new(2.0, 0.5),
    );
    let trigger = world
        .spawn(PlatformTrigger::new([platform]).with_cooldown(1.0))
        .id();
    info!("Trigger platform {:?} fired by {:?}", platform, trigger);
    vec![
        Cue::Fire { at: 0.5, trigger },
        // inside the trigger cooldown, ignored
        Cue::Fire { at: 0.8, trigger },
        Cue::Fire { at: 8.0, trigger },
    ]
}

fn build_gravity(world: &mut World, config: PlatformConfig) -> Vec<Cue> {
    let level = world
        .spawn((MapPosition::new(0.0, 0.0), Rotation::default()))
        .id();
    let anchors: Vec<Entity> = [Vec2::new(0.0, 3.0), Vec2::new(0.0, -3.0)]
        .into_iter()
        .map(|p| {
            world
                .spawn((Waypoint, MapPosition::from_vec(p), ChildOf(level)))
                .id()
        })
        .collect();
    let platform = spawn_moving_platform(
        world,
        MovingPlatform::new(config, WaypointSource::Anchors(anchors)),
        Vec2::new(0.0, 3.0),
        Vec2::new(2.0, 0.5),
    );
    world.entity_mut(platform).insert(ChildOf(level));
    info!("Gravity platform {:?} inside level {:?}", platform, level);
    vec![Cue::Spin {
        at: 5.0,
        level,
        degrees: 180.0,
        duration: 1.0,
    }]
}

fn apply_cue(world: &mut World, cue: Cue, now: f32, spin: &mut Option<Spin>) {
    match cue {
        Cue::Fire { trigger, .. } => {
            info!("t={:.2} firing trigger {:?}", now, trigger);
            world.trigger(PlatformTriggerEvent { trigger });
        }
        Cue::Spin {
            level,
            degrees,
            duration,
            ..
        } => {
            let from = world.get::<Rotation>(level).map(|r| r.degrees).unwrap_or(0.0);
            info!("t={:.2} rotating level by {} degrees", now, degrees);
            world.resource_mut::<LevelRotation>().begin();
            *spin = Some(Spin {
                level,
                started: now,
                from,
                to: from + degrees,
                duration,
            });
        }
    }
}

fn advance_spin(world: &mut World, now: f32, spin: &mut Option<Spin>) {
    let Some(active) = spin.as_ref() else {
        return;
    };
    let progress = ((now - active.started) / active.duration.max(f32::EPSILON)).clamp(0.0, 1.0);
    let degrees = active.from + (active.to - active.from) * progress;
    let level = active.level;
    if let Some(mut rotation) = world.get_mut::<Rotation>(level) {
        rotation.degrees = degrees;
    }
    let mut level_rotation = world.resource_mut::<LevelRotation>();
    level_rotation.set_progress(progress);
    if progress >= 1.0 {
        level_rotation.finish();
        *spin = None;
        info!("t={:.2} level rotation finished", now);
    }
}

fn log_platforms(world: &mut World, now: f32) {
    let mut query = world.query::<(Entity, &GlobalTransform2D, &MovingPlatform)>();
    for (entity, transform, platform) in query.iter(world) {
        info!(
            "t={:.1} {:?} {:?} at ({:.2}, {:.2}){}",
            now,
            platform.kind(),
            entity,
            transform.position.x,
            transform.position.y,
            if platform.is_moving() { " moving" } else { "" }
        );
    }
}

fn run_scenario(
    scenario: Scenario,
    settings: &PlatformSettings,
    custom: Option<&PlatformConfig>,
    seconds: f32,
    dt: f32,
) {
    info!("=== {:?} scenario ===", scenario);
    let mut world = World::new();
    setup_world(&mut world, settings.clone());
    log_bus_events(&mut world);

    let mut cues = match scenario {
        Scenario::Loop => build_loop(
            &mut world,
            scenario_config(settings, "loop", MovementKind::Loop, custom),
        ),
        Scenario::Trigger => {
            let mut config = scenario_config(settings, "trigger", MovementKind::Trigger, custom);
            if custom.is_none() && !settings.platforms.contains_key("trigger") {
                config.trigger_mode = TriggerMode::FullPath;
                config.return_to_start = true;
            }
            build_trigger(&mut world, config)
        }
        Scenario::Gravity => build_gravity(
            &mut world,
            scenario_config(settings, "gravity", MovementKind::Gravity, custom),
        ),
        Scenario::All => Vec::new(),
    };
    cues.sort_by(|a, b| a.at().total_cmp(&b.at()));
    let mut cues = cues.into_iter().peekable();

    let mut update = build_update_schedule();
    let mut fixed = build_fixed_schedule();
    let mut spin = None;
    let mut next_report = 0.0;
    let frames = (seconds / dt).ceil().max(0.0) as u32;
    for _ in 0..frames {
        let now = world.resource::<WorldTime>().elapsed;
        while let Some(cue) = cues.next_if(|cue| cue.at() <= now) {
            apply_cue(&mut world, cue, now, &mut spin);
        }
        advance_spin(&mut world, now, &mut spin);
        run_frame(&mut world, &mut update, &mut fixed, dt);
        if now >= next_report {
            log_platforms(&mut world, now);
            next_report += 1.0;
        }
    }
    teardown(&mut world);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if !(cli.dt.is_finite() && cli.dt > 0.0) {
        error!("--dt must be a positive number of seconds");
        std::process::exit(1);
    }

    let mut settings = PlatformSettings::with_path(&cli.config);
    if let Err(e) = settings.load_from_file() {
        warn!("{}, using default settings", e);
    }

    let custom = match cli.platform_config.as_deref().map(load_json_config).transpose() {
        Ok(custom) => custom,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let scenarios = match cli.scenario {
        Scenario::All => vec![Scenario::Loop, Scenario::Trigger, Scenario::Gravity],
        scenario => vec![scenario],
    };
    for scenario in scenarios {
        run_scenario(scenario, &settings, custom.as_ref(), cli.seconds, cli.dt);
    }
}
