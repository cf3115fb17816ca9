//! Shared handler operation: prompt plan in, token source session out,
//! text deltas forwarded live and accumulated into the final body.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use docstream_core::api::{
    accumulate, smooth_words, text_deltas, DocumentKind, HandlerOp, HandlerRequest, SourceRequest,
    StreamError, TokenSource,
};

use super::prompts::update_document_prompt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub task: String,
    pub prediction: Option<String>,
}

/// Kind-specific prompt construction.
pub trait PromptPlan: Send + Sync {
    fn create(&self, title: &str) -> PromptPair;

    fn update(&self, kind: DocumentKind, existing: &str, description: &str) -> PromptPair {
        PromptPair {
            system: update_document_prompt(existing, kind),
            task: description.to_string(),
            prediction: Some(existing.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub model_id: String,
    pub idle_timeout: Option<Duration>,
    /// Re-chunk text on word boundaries with this delay between chunks.
    pub smoothing: Option<Duration>,
}

pub struct StreamingOp {
    plan: Arc<dyn PromptPlan>,
    side: Side,
    source: Arc<dyn TokenSource>,
    settings: StreamSettings,
}

impl StreamingOp {
    pub fn new(
        plan: Arc<dyn PromptPlan>,
        side: Side,
        source: Arc<dyn TokenSource>,
        settings: StreamSettings,
    ) -> Self {
        Self {
            plan,
            side,
            source,
            settings,
        }
    }

    fn prompts(&self, request: &HandlerRequest<'_>) -> PromptPair {
        match self.side {
            Side::Create => self.plan.create(request.prompt),
            Side::Update => self.plan.update(
                request.kind,
                request.existing_content.unwrap_or_default(),
                request.prompt,
            ),
        }
    }
}

#[async_trait]
impl HandlerOp for StreamingOp {
    async fn run(&self, request: HandlerRequest<'_>) -> Result<String, StreamError> {
        let prompts = self.prompts(&request);
        let source_request = SourceRequest {
            model_id: self.settings.model_id.clone(),
            system_prompt: prompts.system,
            task_prompt: prompts.task,
            prediction: prompts.prediction,
        };

        tracing::debug!(
            target: "docstream.handler",
            kind = %request.kind,
            side = ?self.side,
            source = %self.source.name(),
            "opening token source"
        );

        let opened = self.source.open(source_request);
        let events = match self.settings.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, opened)
                .await
                .map_err(|_| StreamError::Timeout {
                    idle_ms: limit.as_millis() as u64,
                })??,
            None => opened.await?,
        };

        let deltas = text_deltas(events).boxed();
        let deltas = match self.settings.smoothing {
            Some(delay) => smooth_words(deltas, delay).boxed(),
            None => deltas,
        };

        accumulate(deltas, request.channel, self.settings.idle_timeout).await
    }
}
