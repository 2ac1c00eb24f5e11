//! Outbound notifications emitted after successful writes.

use std::sync::{Arc, Mutex};

/// Event name used for every ledger and record notification.
pub const NOTIFICATION_EVENT: &str = "notification";

/// Fire-and-forget sink for human readable events.
///
/// Implementations must not block; the engine calls `broadcast` after the
/// database transaction has committed and ignores the outcome.
pub trait Notifier: Send + Sync {
    fn broadcast(&self, event: &str, message: String);
}

/// Drops every event. Used when no notifier is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn broadcast(&self, _event: &str, _message: String) {}
}

/// Keeps every event in memory, handy for tests and the admin tool.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded `(event, message)` pairs.
    pub fn events(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|(_, message)| message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn broadcast(&self, event: &str, message: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.to_string(), message));
        }
    }
}
