//! Token source that replays a recorded session from a JSONL file.
//!
//! Each line is one event:
//! `{"type":"text-delta","textDelta":"..."}`, `{"type":"reasoning","textDelta":"..."}`,
//! `{"type":"finish","finishReason":"stop"}` or `{"type":"error","error":"..."}`.
//! Blank lines are ignored.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde::Deserialize;

use docstream_core::api::{SourceEvent, SourceRequest, SourceStream, StreamError, TokenSource};

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ReplayRecord {
    #[serde(rename_all = "camelCase")]
    TextDelta { text_delta: String },
    #[serde(rename_all = "camelCase")]
    Reasoning { text_delta: String },
    #[serde(rename_all = "camelCase")]
    Finish {
        #[serde(default)]
        finish_reason: Option<String>,
    },
    Error { error: String },
}

impl From<ReplayRecord> for SourceEvent {
    fn from(record: ReplayRecord) -> Self {
        match record {
            ReplayRecord::TextDelta { text_delta } => SourceEvent::TextDelta(text_delta),
            ReplayRecord::Reasoning { text_delta } => SourceEvent::Reasoning(text_delta),
            ReplayRecord::Finish { finish_reason } => SourceEvent::Finish {
                reason: finish_reason,
            },
            ReplayRecord::Error { error } => SourceEvent::Error(error),
        }
    }
}

pub struct ReplayTokenSource {
    events_file: String,
}

impl ReplayTokenSource {
    pub fn new(events_file: String) -> Self {
        Self { events_file }
    }
}

pub(crate) fn parse_replay(raw: &str) -> Vec<Result<SourceEvent, StreamError>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<ReplayRecord>(line)
                .map(SourceEvent::from)
                .map_err(|e| StreamError::Decode(format!("replay line {}: {e}", idx + 1)))
        })
        .collect()
}

#[async_trait]
impl TokenSource for ReplayTokenSource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn open(&self, request: SourceRequest) -> Result<SourceStream, StreamError> {
        let raw = tokio::fs::read_to_string(&self.events_file)
            .await
            .map_err(|e| {
                StreamError::Transport(
                    anyhow::Error::new(e).context(format!("read {}", self.events_file)),
                )
            })?;

        tracing::debug!(
            target: "docstream.source",
            file = %self.events_file,
            model = %request.model_id,
            "replaying recorded session"
        );

        Ok(stream::iter(parse_replay(&raw)).boxed())
    }
}
