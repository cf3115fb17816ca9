use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::channel::LiveChannel;
use crate::delta::StreamDelta;
use crate::document::Document;
use crate::error::DocumentError;
use crate::events_out::AuditEvent;
use crate::registry::HandlerRequest;

use super::{run_handler_op, DocumentCoordinator, UpdateDocument};

impl DocumentCoordinator {
    /// Regenerates the body of an existing document from `request.description`.
    ///
    /// Updates to the same id are serialized; each one sees the content
    /// persisted by the previous one.
    pub async fn update_document(
        &self,
        request: UpdateDocument,
        channel: &LiveChannel,
        cancel: &CancellationToken,
    ) -> Result<Document, DocumentError> {
        let id = request.id.clone();
        let lock = self.update_locks.lock_for(&id);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DocumentError::Cancelled),
            _guard = lock.lock() => self.run_update(request, channel, cancel).await,
        };
        self.conclude("update", &id, result, channel).await
    }

    async fn run_update(
        &self,
        request: UpdateDocument,
        channel: &LiveChannel,
        cancel: &CancellationToken,
    ) -> Result<Document, DocumentError> {
        let existing = self
            .store
            .load_document(&request.id)
            .await
            .map_err(DocumentError::Persistence)?
            .ok_or_else(|| DocumentError::NotFound(request.id.clone()))?;

        let descriptor = self.registry.resolve(existing.kind)?;

        tracing::info!(
            target: "docstream.coordinator",
            document_id = %existing.id,
            kind = %existing.kind,
            previous_bytes = existing.content.len(),
            "updating document"
        );
        self.audit(AuditEvent::new("document.update.start", &existing.id).with_data(
            serde_json::json!({
                "kind": existing.kind,
                "description": request.description,
            }),
        ))
        .await;

        channel.write(StreamDelta::Clear).await;

        let content = run_handler_op(
            descriptor.on_update.as_ref(),
            HandlerRequest {
                kind: existing.kind,
                prompt: &request.description,
                existing_content: Some(&existing.content),
                channel,
            },
            cancel,
        )
        .await?;

        if cancel.is_cancelled() {
            return Err(DocumentError::Cancelled);
        }

        let document = existing.revised(content, Utc::now());
        self.store
            .save_document(&document)
            .await
            .map_err(DocumentError::Persistence)?;
        Ok(document)
    }
}
