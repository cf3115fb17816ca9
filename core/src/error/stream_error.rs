use thiserror::Error;

/// Failure of a token stream before it reached its terminal signal.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("upstream error event: {0}")]
    Upstream(String),

    #[error("no delta received within {idle_ms}ms")]
    Timeout { idle_ms: u64 },

    #[error("unexpected status from model endpoint: {status}")]
    Http { status: u16, body: String },

    #[error("transport error: {0:#}")]
    Transport(#[source] anyhow::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

impl StreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StreamError::Timeout { .. })
    }
}
