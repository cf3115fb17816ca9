use std::time::Duration;

use futures::{Stream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;

use super::StreamDelta;
use crate::error::StreamError;

lazy_static! {
    static ref WORD_CHUNK: Regex = Regex::new(r"\S+\s+").expect("static regex");
}

/// Re-chunks text deltas so every emitted fragment ends after a word and its
/// trailing whitespace. Non-text deltas flush the pending buffer first; the
/// remainder is flushed when the source ends. The concatenation of text is
/// unchanged.
pub fn smooth_words<S>(
    source: S,
    delay: Duration,
) -> impl Stream<Item = Result<StreamDelta, StreamError>> + Send
where
    S: Stream<Item = Result<StreamDelta, StreamError>> + Send,
{
    async_stream::stream! {
        let mut source = Box::pin(source);
        let mut buffer = String::new();
        let mut failed = false;

        while let Some(item) = source.next().await {
            match item {
                Ok(StreamDelta::TextDelta(text)) => {
                    buffer.push_str(&text);
                    while let Some(end) = WORD_CHUNK.find(&buffer).map(|m| m.end()) {
                        let rest = buffer.split_off(end);
                        let chunk = std::mem::replace(&mut buffer, rest);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        yield Ok(StreamDelta::TextDelta(chunk));
                    }
                }
                Ok(other) => {
                    if !buffer.is_empty() {
                        yield Ok(StreamDelta::TextDelta(std::mem::take(&mut buffer)));
                    }
                    yield Ok(other);
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed && !buffer.is_empty() {
            yield Ok(StreamDelta::TextDelta(buffer));
        }
    }
}
