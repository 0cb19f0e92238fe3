//! Local publish/subscribe for server events.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{error, warn};

use dealerhub_core::types::UserId;
use dealerhub_realtime::message::RealtimeEvent;

/// A server event as seen by local handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientEvent {
    pub event: RealtimeEvent,
    pub data: Value,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub room: Option<String>,
}

/// Error a handler may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Arc<dyn Fn(&ClientEvent) -> Result<(), HandlerError> + Send + Sync>;

/// Event type → handlers in registration order.
#[derive(Default)]
pub struct EventBus {
    handlers: DashMap<RealtimeEvent, Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` for `event`.
    ///
    /// The returned handle removes it again; dropping the handle keeps the
    /// handler registered.
    pub fn subscribe<F>(self: &Arc<Self>, event: RealtimeEvent, handler: F) -> Subscription
    where
        F: Fn(&ClientEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            bus: Arc::downgrade(self),
            event,
            id,
        }
    }

    fn remove(&self, event: RealtimeEvent, id: u64) -> bool {
        let Some(mut handlers) = self.handlers.get_mut(&event) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() < before;
        if handlers.is_empty() {
            drop(handlers);
            self.handlers.remove_if(&event, |_, h| h.is_empty());
        }
        removed
    }

    /// Invoke every handler for the event, in registration order.
    ///
    /// A handler that fails or panics is logged and does not stop the
    /// others. Returns the number of handlers that succeeded.
    pub fn emit(&self, event: &ClientEvent) -> usize {
        let handlers: Vec<(u64, Handler)> = self
            .handlers
            .get(&event.event)
            .map(|h| h.value().clone())
            .unwrap_or_default();

        let mut succeeded = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => {
                    warn!(event = %event.event, handler = id, error = %e, "Event handler failed");
                }
                Err(_) => {
                    error!(event = %event.event, handler = id, "Event handler panicked");
                }
            }
        }
        succeeded
    }

    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: RealtimeEvent) -> usize {
        self.handlers.get(&event).map(|h| h.len()).unwrap_or(0)
    }

    /// Whether any handler is registered for `event`.
    pub fn has_handlers(&self, event: RealtimeEvent) -> bool {
        self.handlers.contains_key(&event)
    }
}

/// Handle to one registered handler.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<EventBus>,
    event: RealtimeEvent,
    id: u64,
}

impl Subscription {
    /// Remove the handler. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.remove(self.event, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn event(kind: RealtimeEvent) -> ClientEvent {
        ClientEvent {
            event: kind,
            data: serde_json::json!({"id": 1}),
            user_id: None,
            username: None,
            timestamp: Utc::now(),
            room: None,
        }
    }

    #[test]
    fn test_handlers_run_in_order_despite_failures() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let c = calls.clone();
        bus.subscribe(RealtimeEvent::VehicleCreated, move |_| {
            c.lock().unwrap().push("first");
            Err("boom".into())
        });
        let c = calls.clone();
        bus.subscribe(RealtimeEvent::VehicleCreated, move |_| {
            c.lock().unwrap().push("second");
            panic!("handler bug");
        });
        let c = calls.clone();
        bus.subscribe(RealtimeEvent::VehicleCreated, move |_| {
            c.lock().unwrap().push("third");
            Ok(())
        });

        let ok = bus.emit(&event(RealtimeEvent::VehicleCreated));

        assert_eq!(ok, 1);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_drops_empty_key() {
        let bus = EventBus::new();
        let a = bus.subscribe(RealtimeEvent::LeadCreated, |_| Ok(()));
        let b = bus.subscribe(RealtimeEvent::LeadCreated, |_| Ok(()));
        assert_eq!(bus.handler_count(RealtimeEvent::LeadCreated), 2);

        assert!(a.unsubscribe());
        assert!(bus.has_handlers(RealtimeEvent::LeadCreated));
        assert!(b.unsubscribe());
        assert!(!bus.has_handlers(RealtimeEvent::LeadCreated));
        assert_eq!(bus.emit(&event(RealtimeEvent::LeadCreated)), 0);
    }

    #[test]
    fn test_other_event_types_are_not_called() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = hits.clone();
        let _sub = bus.subscribe(RealtimeEvent::JobUpdated, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit(&event(RealtimeEvent::JobCreated));
        bus.emit(&event(RealtimeEvent::JobUpdated));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
