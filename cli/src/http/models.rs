use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use docstream_core::api::DocumentError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentRequest {
    pub kind: String,
    pub title: String,
    #[serde(default = "default_owner", alias = "ownerId")]
    pub owner_id: String,
}

fn default_owner() -> String {
    "anonymous".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDocumentRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub operation_id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: std::collections::HashMap<String, u64>,
    pub active_operations: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

#[derive(Debug, Error)]
pub enum HttpServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl HttpServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            HttpServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            HttpServerError::OperationNotFound(_) => (StatusCode::NOT_FOUND, "operation_not_found"),
            HttpServerError::Document(e) => {
                let status = match e {
                    DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
                    DocumentError::UnsupportedKind(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    DocumentError::Cancelled => StatusCode::CONFLICT,
                    DocumentError::Stream(_) => StatusCode::BAD_GATEWAY,
                    DocumentError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
