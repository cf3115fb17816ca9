use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document snapshot encode/decode error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("document store backend error: {0}")]
    Backend(String),
}
