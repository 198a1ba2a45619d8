//! Event Bus - fan-out of broadcast events
//!
//! Components emit, consumers (TCP server, file logger) subscribe. Sending with
//! no subscribers drops the event.

use tokio::sync::broadcast;
use tracing::debug;

use super::types::BroadcastEvent;
use crate::session::TimerEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Central bus that every listener subscribes to
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: BroadcastEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle that does not own the bus
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter { tx: self.tx.clone() }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Cheap cloneable sending side of the bus
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl EventEmitter {
    /// Emit a raw broadcast event
    pub fn emit(&self, event: BroadcastEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    /// Mirror a timer event, skipping kinds that are not broadcast
    pub fn timer_event(&self, event: &TimerEvent) {
        if let Some(event) = BroadcastEvent::from_timer_event(event) {
            self.emit(event);
        }
    }
}
