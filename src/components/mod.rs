//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the platform world: transforms, colliders, platforms and their riders.
//!
//! Submodules overview:
//! - [`boxcollider`] – axis-aligned rectangular collider for overlap and cast queries
//! - [`collisionlayer`] – layer bits used to filter obstacle casts
//! - [`globaltransform2d`] – resolved world transform of an entity
//! - [`mapposition`] – parent-local position (pivot) for an entity
//! - [`movingplatform`] – platform orchestrator owning config, waypoints and strategy
//! - [`platformconfig`] – tunable platform parameters (JSON and INI)
//! - [`platformcontroller`] – rider set and per-tick carry displacement
//! - [`platformtrigger`] – level object that activates Trigger platforms
//! - [`riderdetector`] – sensor strip marking riders standing on a platform
//! - [`rotation`] – rotation angle in degrees
//! - [`scale`] – 2D scale factor
//! - [`tween`] – eased path interpolation driving platform motion
//! - [`waypoint`] – waypoint anchors and waypoint sources

pub mod boxcollider;
pub mod collisionlayer;
pub mod globaltransform2d;
pub mod mapposition;
pub mod movingplatform;
pub mod platformconfig;
pub mod platformcontroller;
pub mod platformtrigger;
pub mod riderdetector;
pub mod rotation;
pub mod scale;
pub mod tween;
pub mod waypoint;
