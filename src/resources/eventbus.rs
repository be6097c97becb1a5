//! Publish/subscribe bus for gameplay notifications.
//!
//! The bus is a world resource created by [`init_event_bus`] and torn down
//! by [`shutdown_event_bus`]. Handlers are multicast per [`EventKind`] and
//! receive the bus itself, so a handler may subscribe, unsubscribe (itself
//! included) or publish while a dispatch is running.
//!
//! Subscriptions may be scoped to an owning entity with
//! [`EventBus::subscribe_scoped`]; [`EventBus::unsubscribe_owner`] then drops
//! everything that entity registered in one call.
//!
//! # Example
//!
//! ```ignore
//! let id = bus.subscribe(EventKind::PlatformStopMove, Box::new(|_bus, payload| {
//!     log::info!("platform stopped: {:?}", payload);
//! }));
//! bus.publish(EventKind::PlatformStopMove, Some(EventPayload::Platform(entity)));
//! bus.unsubscribe(EventKind::PlatformStopMove, id);
//! ```

use bevy_ecs::prelude::*;
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::events::platform::{EventKind, EventPayload};

pub type SubscriptionId = u64;

pub type EventHandler = Box<dyn FnMut(&mut EventBus, Option<&EventPayload>) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    owner: Option<Entity>,
    /// `None` while the handler is being invoked.
    handler: Option<EventHandler>,
}

#[derive(Resource, Default)]
pub struct EventBus {
    handlers: FxHashMap<EventKind, Vec<Subscription>>,
    next_id: SubscriptionId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.insert(kind, None, handler)
    }

    /// Subscribe on behalf of `owner`; see [`EventBus::unsubscribe_owner`].
    pub fn subscribe_scoped(
        &mut self,
        kind: EventKind,
        owner: Entity,
        handler: EventHandler,
    ) -> SubscriptionId {
        self.insert(kind, Some(owner), handler)
    }

    fn insert(
        &mut self,
        kind: EventKind,
        owner: Option<Entity>,
        handler: EventHandler,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = self.next_id;
        self.handlers.entry(kind).or_default().push(Subscription {
            id,
            owner,
            handler: Some(handler),
        });
        id
    }

    /// Remove one handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(&kind);
        }
        removed
    }

    /// Remove every handler registered for `owner`, across all kinds.
    pub fn unsubscribe_owner(&mut self, owner: Entity) -> usize {
        let mut removed = 0;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|s| s.owner != Some(owner));
            removed += before - list.len();
            !list.is_empty()
        });
        if removed > 0 {
            debug!("Removed {} subscriptions owned by {:?}", removed, owner);
        }
        removed
    }

    /// Invoke every handler of `kind`. No-op when nobody listens.
    ///
    /// The set of handlers is fixed when the publish starts: handlers added
    /// during dispatch wait for the next publish, handlers removed during
    /// dispatch are skipped.
    pub fn publish(&mut self, kind: EventKind, payload: Option<EventPayload>) {
        let ids: SmallVec<[SubscriptionId; 8]> = match self.handlers.get(&kind) {
            Some(list) => list.iter().map(|s| s.id).collect(),
            None => return,
        };
        for id in ids {
            let Some(mut handler) = self.slot(kind, id).and_then(|s| s.handler.take()) else {
                continue;
            };
            handler(self, payload.as_ref());
            if let Some(sub) = self.slot(kind, id) {
                sub.handler = Some(handler);
            }
        }
    }

    fn slot(&mut self, kind: EventKind, id: SubscriptionId) -> Option<&mut Subscription> {
        self.handlers
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|s| s.id == id))
    }

    pub fn clear(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    pub fn clear_all(&mut self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, |l| l.len())
    }

    pub fn has_kind(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

/// Insert a fresh [`EventBus`] into the world.
pub fn init_event_bus(world: &mut World) {
    world.insert_resource(EventBus::new());
}

/// Drop every subscription and remove the bus from the world.
pub fn shutdown_event_bus(world: &mut World) {
    if let Some(mut bus) = world.remove_resource::<EventBus>() {
        bus.clear_all();
    }
}
