//! Typed publish/subscribe bus decoupling the selection UI from the scene host.
//!
//! Delivery is synchronous, on the publisher's thread, in subscription order.
//! Payloads are plain identifiers, never live scene or engine handles.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Messages carried by the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// The user picked a scene; the id may be unknown to the registry
    SceneChanged(String),
    /// The user asked to flip the inspector overlay
    InspectorToggle,
}

impl SceneEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SceneEvent::SceneChanged(_) => EventKind::SceneChanged,
            SceneEvent::InspectorToggle => EventKind::InspectorToggle,
        }
    }
}

/// Subscription key, one per [`SceneEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SceneChanged,
    InspectorToggle,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::SceneChanged => write!(f, "sceneChanged"),
            EventKind::InspectorToggle => write!(f, "inspectorToggle"),
        }
    }
}

/// Token returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handler signature. Errors are collected by `publish`, never swallowed.
pub type Handler = Rc<dyn Fn(&SceneEvent) -> anyhow::Result<()>>;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("{} of {total} handler(s) for {kind} failed", .failures.len())]
    HandlerFailed {
        kind: EventKind,
        total: usize,
        failures: Vec<anyhow::Error>,
    },
}

#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SceneEvent) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(handler)));

        log::trace!("subscribed {:?} to {}", id, kind);
        id
    }

    /// Subscribe and get a guard that unsubscribes when dropped
    pub fn subscribe_scoped<F>(self: &Rc<Self>, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&SceneEvent) -> anyhow::Result<()> + 'static,
    {
        let id = self.subscribe(kind, handler);
        Subscription {
            bus: Rc::downgrade(self),
            kind,
            id,
        }
    }

    /// Removing an unknown pair is a no-op
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(&kind) else {
            return;
        };

        list.retain(|(existing, _)| *existing != id);
        if list.is_empty() {
            handlers.remove(&kind);
        }
    }

    /// Invoke every handler for the event's kind, in subscription order.
    ///
    /// A failing handler does not stop the others; all failures are logged
    /// and returned together.
    pub fn publish(&self, event: &SceneEvent) -> Result<(), BusError> {
        let kind = event.kind();

        // Snapshot so handlers can (un)subscribe while we dispatch
        let snapshot: Vec<Handler> = match self.handlers.borrow().get(&kind) {
            Some(list) => list.iter().map(|(_, handler)| Rc::clone(handler)).collect(),
            None => return Ok(()),
        };

        let total = snapshot.len();
        let failures: Vec<anyhow::Error> = snapshot
            .iter()
            .filter_map(|handler| handler(event).err())
            .inspect(|err| log::error!("{} handler failed: {:#}", kind, err))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::HandlerFailed { kind, total, failures })
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Whether any registration entry exists for `kind`
    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.handlers.borrow().contains_key(&kind)
    }
}

/// Unsubscribes its handler on drop
pub struct Subscription {
    bus: Weak<EventBus>,
    kind: EventKind,
    id: SubscriptionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.id);
        }
    }
}
