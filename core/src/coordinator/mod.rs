//! Drives create/update cycles: handler resolution, live control deltas,
//! stream consumption, and the single persistence write.

mod create;
mod locks;
mod types;
mod update;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::channel::LiveChannel;
use crate::delta::StreamDelta;
use crate::document::Document;
use crate::error::DocumentError;
use crate::events_out::{write_audit_event, AuditEvent, EventsOutTx};
use crate::registry::{HandlerOp, HandlerRegistry, HandlerRequest};
use crate::store::DocumentStore;

use locks::IdLocks;

pub use types::{CreateDocument, UpdateDocument};

pub struct DocumentCoordinator {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn DocumentStore>,
    events_out: Option<EventsOutTx>,
    update_locks: IdLocks,
}

impl DocumentCoordinator {
    pub fn new(registry: Arc<HandlerRegistry>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            registry,
            store,
            events_out: None,
            update_locks: IdLocks::default(),
        }
    }

    pub fn with_events_out(mut self, events_out: Option<EventsOutTx>) -> Self {
        self.events_out = events_out;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn document(&self, id: &str) -> Result<Document, DocumentError> {
        self.store
            .load_document(id)
            .await
            .map_err(DocumentError::Persistence)?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    pub async fn versions(&self, id: &str) -> Result<Vec<Document>, DocumentError> {
        let versions = self
            .store
            .list_versions(id)
            .await
            .map_err(DocumentError::Persistence)?;
        if versions.is_empty() {
            return Err(DocumentError::NotFound(id.to_string()));
        }
        Ok(versions)
    }

    async fn audit(&self, event: AuditEvent) {
        write_audit_event(self.events_out.as_ref(), &event).await;
    }

    /// Emits the terminal delta and audit record for a finished operation.
    async fn conclude(
        &self,
        op: &'static str,
        id: &str,
        result: Result<Document, DocumentError>,
        channel: &LiveChannel,
    ) -> Result<Document, DocumentError> {
        match &result {
            Ok(doc) => {
                channel.write(StreamDelta::Finish).await;
                tracing::info!(
                    target: "docstream.coordinator",
                    op,
                    document_id = %doc.id,
                    kind = %doc.kind,
                    bytes = doc.content.len(),
                    live_dropped = channel.dropped_count(),
                    "document persisted"
                );
                self.audit(AuditEvent::new("document.persisted", id).with_data(
                    serde_json::json!({
                        "op": op,
                        "kind": doc.kind,
                        "bytes": doc.content.len(),
                        "updated_at": doc.updated_at.to_rfc3339(),
                    }),
                ))
                .await;
            }
            Err(e) => {
                // a cancelled operation stops talking to the client entirely
                if !matches!(e, DocumentError::Cancelled) {
                    channel
                        .write(StreamDelta::Error(format!("{}: {}", e.code(), e)))
                        .await;
                }
                tracing::warn!(
                    target: "docstream.coordinator",
                    op,
                    document_id = %id,
                    code = e.code(),
                    error = ?e,
                    "document operation failed"
                );
                self.audit(AuditEvent::new("document.failed", id).with_data(
                    serde_json::json!({ "op": op, "code": e.code(), "error": e.to_string() }),
                ))
                .await;
            }
        }
        result
    }
}

/// Runs a handler operation unless `cancel` fires first. Cancellation drops
/// the operation future, which closes its token source session.
async fn run_handler_op(
    op: &dyn HandlerOp,
    request: HandlerRequest<'_>,
    cancel: &CancellationToken,
) -> Result<String, DocumentError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DocumentError::Cancelled),
        res = op.run(request) => res.map_err(DocumentError::from),
    }
}
