//! Event bus: synchronous publish/subscribe keyed by `EventKind`.
//!
//! Listeners run immediately inside `emit`, in the order they subscribed,
//! with exclusive access to the `World`. Entities subscribe with themselves
//! as owner so that `scene::destroy` can drop every subscription they hold
//! in one call.
//!
//! Delivery iterates over a snapshot of the subscriber list, so listeners may
//! emit, subscribe, or destroy entities while an emission is in flight:
//! - a subscription added during an emission only sees later emissions;
//! - a subscription removed during an emission is not called again, even if
//!   it was part of the snapshot.
//!
//! A listener that returns `Err` or panics is logged at `warn`; the remaining
//! listeners still receive the event.

use bevy::prelude::*;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

use crate::shared::*;

/// Why a listener could not handle an event. Logged by the bus; never fatal.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("entity {0:?} has no {1} component")]
    MissingComponent(Entity, &'static str),
    #[error("resource {0} is not available")]
    MissingResource(&'static str),
    #[error("could not encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Listener =
    Arc<dyn Fn(&mut World, &GameEvent) -> Result<(), ListenerError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    owner: Option<Entity>,
    listener: Listener,
}

#[derive(Resource, Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    /// Register `listener` for every future event of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, owner: Option<Entity>, listener: F) -> SubscriptionId
    where
        F: Fn(&mut World, &GameEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let listener: Listener = Arc::new(listener);
        self.subscriptions.push(Subscription { id, kind, owner, listener });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Drop every subscription registered under `owner`. Returns how many were removed.
    pub fn unsubscribe_all(&mut self, owner: Entity) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.owner != Some(owner));
        before - self.subscriptions.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn owned_by(&self, owner: Entity) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.owner == Some(owner))
            .count()
    }

    fn is_live(&self, id: SubscriptionId) -> bool {
        self.subscriptions.iter().any(|s| s.id == id)
    }

    fn listeners_for(&self, kind: EventKind) -> Vec<(SubscriptionId, Listener)> {
        self.subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| (s.id, Arc::clone(&s.listener)))
            .collect()
    }
}

/// Deliver `event` to every current subscriber of its kind.
pub fn emit(world: &mut World, event: GameEvent) {
    let kind = event.kind();
    let Some(bus) = world.get_resource::<EventBus>() else {
        warn!("[EventBus] No bus installed; dropping {}", kind);
        return;
    };
    let snapshot = bus.listeners_for(kind);

    for (id, listener) in snapshot {
        let live = world
            .get_resource::<EventBus>()
            .is_some_and(|bus| bus.is_live(id));
        if !live {
            continue;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| listener(world, &event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("[EventBus] {} listener failed: {}", kind, err),
            Err(payload) => warn!(
                "[EventBus] {} listener panicked: {}",
                kind,
                panic_message(payload.as_ref())
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Subscribe a listener that logs every event in its wire form at `debug`.
pub fn install_wire_logger(bus: &mut EventBus) {
    for kind in EventKind::ALL {
        bus.subscribe(kind, None, log_wire);
    }
}

fn log_wire(_world: &mut World, event: &GameEvent) -> Result<(), ListenerError> {
    let wire = event.to_wire()?;
    debug!("[EventBus] {}", wire);
    Ok(())
}

pub struct EventBusPlugin;

impl Plugin for EventBusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
