//! Append-only JSONL audit trail of document lifecycle events.

mod audit;
mod writer;

pub use crate::config::EventsOutConfig;
pub use audit::{write_audit_event, AuditEvent};
pub use writer::{start_events_out, EventsOutTx, EventsOutWriter};
