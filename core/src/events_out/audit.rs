use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EventsOutTx;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub v: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub ts: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AuditEvent {
    pub fn new(event_type: &str, document_id: &str) -> Self {
        Self {
            v: 1,
            event_type: event_type.to_string(),
            ts: Utc::now().to_rfc3339(),
            document_id: Some(document_id.to_string()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

pub async fn write_audit_event(out: Option<&EventsOutTx>, event: &AuditEvent) {
    let Some(out) = out else {
        return;
    };
    match serde_json::to_string(event) {
        Ok(line) => out.send_line(line).await,
        Err(e) => tracing::warn!(
            target: "docstream.events_out",
            error = %e,
            event_type = %event.event_type,
            "failed to encode audit event"
        ),
    }
}
