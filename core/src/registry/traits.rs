use async_trait::async_trait;

use crate::channel::LiveChannel;
use crate::document::DocumentKind;
use crate::error::StreamError;

/// Input handed to a create or update operation.
pub struct HandlerRequest<'a> {
    pub kind: DocumentKind,
    /// Title on create, change description on update.
    pub prompt: &'a str,
    /// Current body on update, `None` on create.
    pub existing_content: Option<&'a str>,
    pub channel: &'a LiveChannel,
}

/// One side of a document handler: builds kind-specific prompts, drives a
/// token source, streams text deltas to the channel and returns the full body.
#[async_trait]
pub trait HandlerOp: Send + Sync {
    async fn run(&self, request: HandlerRequest<'_>) -> Result<String, StreamError>;
}
