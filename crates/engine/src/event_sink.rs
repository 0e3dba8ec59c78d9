//! Where the Arbiter publishes lifecycle events. The real implementation
//! (daemon's event bus, fanning out to the publish endpoint and internal
//! subscribers) lives outside this crate; engine only needs somewhere to
//! hand envelopes off to.

use warden_core::Envelope;

pub trait EventSink: Send + Sync + 'static {
    fn publish(&self, envelope: Envelope);
}

/// Drops every event. Useful for tests that don't assert on the event feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _envelope: Envelope) {}
}

/// Records every published event, for test assertions.
#[derive(Clone, Default)]
pub struct RecordingEventSink {
    events: std::sync::Arc<parking_lot::Mutex<Vec<Envelope>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Envelope> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, envelope: Envelope) {
        self.events.lock().push(envelope);
    }
}
