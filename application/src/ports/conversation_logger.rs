//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording Q&A session events
//! (questions asked, answers received, respondent failures) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! conversation transcript in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload; the adapter adds the
/// UTC timestamp when it writes the record.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "qa_question", "qa_answer", "qa_error").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    /// Create a new conversation event; the adapter stamps the time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and infallible; a logging failure never disturbs
/// the session being recorded.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

/// In-memory logger that keeps every event, for assertions in tests
#[derive(Default)]
pub struct MemoryConversationLogger {
    events: std::sync::Mutex<Vec<(String, Value)>>,
}

impl MemoryConversationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event types recorded so far, in order
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default()
    }

    pub fn payloads(&self, event_type: &str) -> Vec<Value> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|(t, _)| t == event_type)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ConversationLogger for MemoryConversationLogger {
    fn log(&self, event: ConversationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.event_type.to_string(), event.payload));
        }
    }
}
