use futures::{Stream, StreamExt};

use crate::delta::StreamDelta;
use crate::error::StreamError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub task_prompt: String,
    /// Expected output, used by providers that support predicted outputs.
    pub prediction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    TextDelta(String),
    Reasoning(String),
    Finish { reason: Option<String> },
    Error(String),
}

/// Keeps only the text content of a source session as live deltas.
///
/// Upstream error events become stream failures; reasoning and finish
/// markers are not part of the document body.
pub fn text_deltas<S>(source: S) -> impl Stream<Item = Result<StreamDelta, StreamError>> + Send
where
    S: Stream<Item = Result<SourceEvent, StreamError>> + Send,
{
    source.filter_map(|event| async move {
        match event {
            Ok(SourceEvent::TextDelta(text)) => Some(Ok(StreamDelta::TextDelta(text))),
            Ok(SourceEvent::Error(message)) => Some(Err(StreamError::Upstream(message))),
            Ok(SourceEvent::Reasoning(_)) | Ok(SourceEvent::Finish { .. }) => None,
            Err(e) => Some(Err(e)),
        }
    })
}
