//! Event types and observers used by the platform world.
//!
//! Submodules:
//! - [`platform`] – event kinds and payloads carried by the
//!   [`EventBus`](crate::resources::eventbus::EventBus)
//! - [`platformtrigger`] – ECS event fired by level triggers and its observer
//!
//! See each submodule for concrete event data and semantics.
pub mod platform;
pub mod platformtrigger;
