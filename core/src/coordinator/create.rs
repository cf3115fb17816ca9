use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::channel::LiveChannel;
use crate::delta::StreamDelta;
use crate::document::Document;
use crate::error::DocumentError;
use crate::events_out::AuditEvent;
use crate::registry::HandlerRequest;

use super::{run_handler_op, CreateDocument, DocumentCoordinator};

impl DocumentCoordinator {
    /// Generates a new document of `request.kind`.
    ///
    /// Emits `kind`, `id` and `title` before any content, streams the
    /// handler's text deltas, persists exactly one snapshot on success and
    /// then emits `finish`. Nothing is persisted on failure or cancellation.
    pub async fn create_document(
        &self,
        request: CreateDocument,
        channel: &LiveChannel,
        cancel: &CancellationToken,
    ) -> Result<Document, DocumentError> {
        let id = Document::new_id();
        let result = self.run_create(&id, request, channel, cancel).await;
        self.conclude("create", &id, result, channel).await
    }

    async fn run_create(
        &self,
        id: &str,
        request: CreateDocument,
        channel: &LiveChannel,
        cancel: &CancellationToken,
    ) -> Result<Document, DocumentError> {
        let descriptor = self.registry.resolve(request.kind)?;

        tracing::info!(
            target: "docstream.coordinator",
            document_id = %id,
            kind = %request.kind,
            title = %request.title,
            "creating document"
        );
        self.audit(AuditEvent::new("document.create.start", id).with_data(
            serde_json::json!({
                "kind": request.kind,
                "title": request.title,
                "owner_id": request.owner_id,
            }),
        ))
        .await;

        channel.write(StreamDelta::Kind(request.kind)).await;
        channel.write(StreamDelta::Id(id.to_string())).await;
        channel.write(StreamDelta::Title(request.title.clone())).await;

        let content = run_handler_op(
            descriptor.on_create.as_ref(),
            HandlerRequest {
                kind: request.kind,
                prompt: &request.title,
                existing_content: None,
                channel,
            },
            cancel,
        )
        .await?;

        if cancel.is_cancelled() {
            return Err(DocumentError::Cancelled);
        }

        let document = Document::created(
            id.to_string(),
            request.kind,
            request.title,
            request.owner_id,
            content,
            Utc::now(),
        );
        self.store
            .save_document(&document)
            .await
            .map_err(DocumentError::Persistence)?;
        Ok(document)
    }
}
