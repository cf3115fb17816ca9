//! Server-sent-event framing for OpenAI-compatible chat completion streams.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use docstream_core::api::{SourceEvent, StreamError};

/// Splits raw bytes into SSE `data` payloads. A payload is complete at the
/// blank line that ends its event.
#[derive(Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        payloads
    }

    /// Payload left over when the connection closes without a final blank line.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let rest = String::from_utf8_lossy(&rest);
            if let Some(value) = rest.trim_end().strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
        }
        (!self.data.is_empty()).then(|| std::mem::take(&mut self.data).join("\n"))
    }
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

pub(crate) enum Payload {
    Events(Vec<SourceEvent>),
    Done,
}

pub(crate) fn parse_payload(payload: &str) -> Result<Payload, StreamError> {
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(Payload::Done);
    }

    let chunk: CompletionChunk = serde_json::from_str(payload)
        .map_err(|e| StreamError::Decode(format!("invalid completion chunk: {e}")))?;

    if let Some(err) = chunk.error {
        return Ok(Payload::Events(vec![SourceEvent::Error(err.message)]));
    }

    let mut events = Vec::new();
    for choice in chunk.choices {
        if let Some(delta) = choice.delta {
            if let Some(r) = delta.reasoning_content.filter(|r| !r.is_empty()) {
                events.push(SourceEvent::Reasoning(r));
            }
            if let Some(c) = delta.content.filter(|c| !c.is_empty()) {
                events.push(SourceEvent::TextDelta(c));
            }
        }
        if let Some(reason) = choice.finish_reason {
            events.push(SourceEvent::Finish {
                reason: Some(reason),
            });
        }
    }
    Ok(Payload::Events(events))
}

/// Turns a chat-completions byte stream into source events, ending at
/// `[DONE]`, at connection close, or at the first transport/decode failure.
pub(crate) fn completion_events<S, E>(
    bytes: S,
) -> impl Stream<Item = Result<SourceEvent, StreamError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::default();
        let mut done = false;

        'read: while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(StreamError::Transport(anyhow::Error::new(e)));
                    done = true;
                    break 'read;
                }
            };
            for payload in decoder.feed(&chunk) {
                match parse_payload(&payload) {
                    Ok(Payload::Events(events)) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Ok(Payload::Done) => {
                        done = true;
                        break 'read;
                    }
                    Err(e) => {
                        yield Err(e);
                        done = true;
                        break 'read;
                    }
                }
            }
        }

        if !done {
            if let Some(payload) = decoder.finish() {
                match parse_payload(&payload) {
                    Ok(Payload::Events(events)) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Ok(Payload::Done) => {}
                    Err(e) => yield Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunk(text: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(text).unwrap()
        )
    }

    #[test]
    fn decoder_handles_split_lines() {
        let mut d = SseDecoder::default();
        assert!(d.feed(b"data: {\"a\"").is_empty());
        assert!(d.feed(b":1}\r\n").is_empty());
        assert_eq!(d.feed(b"\r\n"), vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn decoder_skips_comments_and_other_fields() {
        let mut d = SseDecoder::default();
        let out = d.feed(b": keepalive\n\nevent: message\ndata: x\n\n");
        assert_eq!(out, vec!["x".to_string()]);
    }

    #[test]
    fn parses_error_chunk_as_upstream_event() {
        match parse_payload(r#"{"error":{"message":"quota exceeded"}}"#).unwrap() {
            Payload::Events(evs) => {
                assert_eq!(evs, vec![SourceEvent::Error("quota exceeded".into())])
            }
            Payload::Done => panic!("expected events"),
        }
    }

    #[tokio::test]
    async fn streams_text_until_done() {
        let body = format!(
            "{}{}data: {{\"choices\":[{{\"delta\":{{}},\"finish_reason\":\"stop\"}}]}}\n\ndata: [DONE]\n\n{}",
            chunk("Hello"),
            chunk(" world"),
            chunk("ignored")
        );
        // split at awkward byte boundaries
        let parts: Vec<Result<Bytes, std::io::Error>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let events: Vec<_> = completion_events(stream::iter(parts))
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(
            events,
            vec![
                SourceEvent::TextDelta("Hello".into()),
                SourceEvent::TextDelta(" world".into()),
                SourceEvent::Finish {
                    reason: Some("stop".into())
                },
            ]
        );
    }

    #[tokio::test]
    async fn invalid_json_fails_the_stream() {
        let parts: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"data: {not json}\n\n"))];
        let events: Vec<_> = completion_events(stream::iter(parts)).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(StreamError::Decode(_))));
    }
}
