//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution. Each submodule documents the
//! semantics and intended usage of its resource(s).
//!
//! Overview
//! - `collisionworld` – per-frame collider snapshot answering box casts
//! - `eventbus` – kind-keyed publish/subscribe bus for platform events
//! - `levelrotation` – level rotation flag and fixed world gravity
//! - `platformcommands` – queued commands for platforms
//! - `platformsettings` – INI settings and named platform configs
//! - `worldtime` – simulation time, delta and the fixed-step accumulator
pub mod collisionworld;
pub mod eventbus;
pub mod levelrotation;
pub mod platformcommands;
pub mod platformsettings;
pub mod worldtime;
