//! In-memory event bus: fans out `Envelope`s published by the Arbiter to
//! every subscriber (the publish endpoint's connected clients, plus anything
//! embedded in-process). No durability — on restart the bus starts empty,
//! matching a supervisor whose authoritative state is "whatever OS processes
//! are actually running", not a replayable event log.

use std::sync::Arc;
use tokio::sync::broadcast;
use warden_core::Envelope;
use warden_engine::EventSink;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every published envelope. The caller filters by topic
    /// prefix itself (delivery here is unfiltered, matching the substring-
    /// prefix match semantics subscribers apply on their own side).
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, envelope: Envelope) {
        // No receivers is the common case between connections; a send error
        // here just means nobody is listening right now.
        let _ = self.tx.send(envelope);
    }
}

/// Adapt a shared `EventBus` to the `warden_engine::EventSink` object the
/// Arbiter is constructed with.
pub fn as_event_sink(bus: EventBus) -> Arc<dyn EventSink> {
    Arc::new(bus)
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
