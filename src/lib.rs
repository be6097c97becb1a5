//! FlashParty moving platforms library.
//!
//! This module exposes the platform components, movement strategies,
//! resources, systems and events for use in integration tests and by a host
//! game loop.

pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod movement;
pub mod resources;
pub mod systems;
