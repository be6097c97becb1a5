//! Platform systems.
//!
//! This module groups all ECS systems that advance the platform simulation.
//!
//! Submodules overview
//! - [`collisionworld`] – rebuild the collider snapshot used for obstacle casts
//! - [`movingplatform`] – apply platform commands and advance strategies
//! - [`platformcontroller`] – carry riders along with their platform
//! - [`platformtrigger`] – tick level trigger cooldowns
//! - [`propagate_transforms`] – compose world transforms down the hierarchy
//! - [`riderdetector`] – track riders entering and leaving platforms
//! - [`time`] – update simulation time and the fixed-step accumulator

pub mod collisionworld;
pub mod movingplatform;
pub mod platformcontroller;
pub mod platformtrigger;
pub mod propagate_transforms;
pub mod riderdetector;
pub mod time;
