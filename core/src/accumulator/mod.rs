//! Folds a delta stream into the final document body while forwarding every
//! delta to the live channel in arrival order.

use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::channel::LiveChannel;
use crate::delta::StreamDelta;
use crate::error::StreamError;

/// In-flight buffer for one operation.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    buffer: String,
    text_deltas: usize,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &StreamDelta) {
        if let StreamDelta::TextDelta(text) = delta {
            self.buffer.push_str(text);
            self.text_deltas += 1;
        }
    }

    pub fn text_deltas(&self) -> usize {
        self.text_deltas
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Drains `source`, forwarding each delta to `channel` and folding text into
/// the buffer. Returns the buffer once the source ends.
///
/// Each wait for the next delta is bounded by `idle_timeout` when set. On
/// failure the partial buffer is dropped.
pub async fn accumulate<S>(
    source: S,
    channel: &LiveChannel,
    idle_timeout: Option<Duration>,
) -> Result<String, StreamError>
where
    S: Stream<Item = Result<StreamDelta, StreamError>> + Send,
{
    let mut source = Box::pin(source);
    let mut acc = DeltaAccumulator::new();

    loop {
        let next = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, source.next())
                .await
                .map_err(|_| StreamError::Timeout {
                    idle_ms: limit.as_millis() as u64,
                })?,
            None => source.next().await,
        };

        match next {
            None => break,
            Some(Ok(delta)) => {
                acc.push(&delta);
                channel.write(delta).await;
            }
            Some(Err(e)) => {
                tracing::debug!(
                    target: "docstream.accumulator",
                    text_deltas = acc.text_deltas(),
                    partial_bytes = acc.content().len(),
                    error = %e,
                    "source failed, discarding partial content"
                );
                return Err(e);
            }
        }
    }

    tracing::debug!(
        target: "docstream.accumulator",
        text_deltas = acc.text_deltas(),
        bytes = acc.content().len(),
        "source completed"
    );
    Ok(acc.finish())
}
