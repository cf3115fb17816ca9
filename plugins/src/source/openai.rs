//! Token source for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;

use docstream_core::api::{SourceRequest, SourceStream, StreamError, TokenSource};

use super::sse::completion_events;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Prediction<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction: Option<Prediction<'a>>,
}

#[derive(Clone)]
pub struct OpenAiTokenSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiTokenSource {
    pub fn new(base_url: String, api_key: String, connect_timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(connect_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TokenSource for OpenAiTokenSource {
    fn name(&self) -> &str {
        "openai"
    }

    async fn open(&self, request: SourceRequest) -> Result<SourceStream, StreamError> {
        let body = ChatRequest {
            model: &request.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.task_prompt,
                },
            ],
            stream: true,
            prediction: request.prediction.as_deref().map(|content| Prediction {
                kind: "content",
                content,
            }),
        };

        let mut req = self.client.post(self.endpoint()).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        tracing::debug!(
            target: "docstream.source",
            model = %request.model_id,
            predicted = request.prediction.is_some(),
            "opening completion stream"
        );

        let resp = req
            .send()
            .await
            .map_err(|e| StreamError::Transport(anyhow::Error::new(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StreamError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(completion_events(resp.bytes_stream()).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstream_core::api::SourceEvent;

    fn request(prediction: Option<&str>) -> SourceRequest {
        SourceRequest {
            model_id: "artifact-model".into(),
            system_prompt: "sys".into(),
            task_prompt: "Dogs".into(),
            prediction: prediction.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn streams_deltas_from_server() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"# Dogs\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\\n\\nLoyal.\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "artifact-model",
                "stream": true,
                "prediction": {"type": "content", "content": "old"}
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let source =
            OpenAiTokenSource::new(format!("{}/v1/", server.url()), "sk-test".into(), 1_000)
                .unwrap();
        let events: Vec<_> = source
            .open(request(Some("old")))
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        mock.assert_async().await;
        assert_eq!(
            events,
            vec![
                SourceEvent::TextDelta("# Dogs".into()),
                SourceEvent::TextDelta("\n\nLoyal.".into()),
            ]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let source = OpenAiTokenSource::new(server.url(), String::new(), 1_000).unwrap();
        match source.open(request(None)).await {
            Err(StreamError::Http { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
