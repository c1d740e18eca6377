//! Notification hand-off.
//!
//! Delivery channels (email, SMS) are out of process; the API records each
//! event as a structured log line that a collector can forward.

use tracing::info;

use permitflow_core::workflow::WorkflowEvent;

/// Emits one log line per workflow event.
pub fn log_events(events: &[WorkflowEvent]) {
    for event in events {
        let payload = serde_json::to_string(event).unwrap_or_default();
        info!(
            event = event.name(),
            application_id = %event.application_id(),
            payload = %payload,
            "Workflow event"
        );
    }
}
