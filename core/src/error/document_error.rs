use thiserror::Error;

use crate::document::DocumentKind;

use super::{StoreError, StreamError};

/// Outcome of a failed create/update, surfaced to whoever drives the
/// coordinator. Every variant leaves the store as it was before the call.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no handler registered for document kind: {0}")]
    UnsupportedKind(DocumentKind),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("token stream failed: {0}")]
    Stream(#[from] StreamError),

    #[error("failed to persist document: {0}")]
    Persistence(#[source] StoreError),

    #[error("operation cancelled")]
    Cancelled,
}

impl DocumentError {
    /// Short stable code used in the terminal `error` delta and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::UnsupportedKind(_) => "unsupported_kind",
            DocumentError::NotFound(_) => "not_found",
            DocumentError::Stream(_) => "stream_error",
            DocumentError::Persistence(_) => "persistence_error",
            DocumentError::Cancelled => "cancelled",
        }
    }
}
