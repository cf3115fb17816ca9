//! Route handlers. Create and update answer with an SSE stream of deltas;
//! the operation keeps running if the client goes away.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::HeaderValue,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use tokio::sync::mpsc;
use uuid::Uuid;

use docstream_core::api::{
    CreateDocument, Document, DocumentKind, LiveChannel, StreamDelta, UpdateDocument,
};

use crate::http::{
    middleware::{deadline_layer, REQUEST_DEADLINE},
    models::*,
    state::AppState,
};

pub const OPERATION_ID_HEADER: &str = "x-operation-id";

pub fn create_router(state: AppState) -> Router {
    let streaming = Router::new()
        .route("/api/v1/documents", post(create_document_handler))
        .route("/api/v1/documents/:id/update", post(update_document_handler));

    let bounded = Router::new()
        .route("/api/v1/documents/:id", get(get_document_handler))
        .route("/api/v1/documents/:id/versions", get(list_versions_handler))
        .route("/api/v1/operations/:op_id/cancel", post(cancel_operation_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .route_layer(deadline_layer(REQUEST_DEADLINE));

    streaming.merge(bounded).with_state(state)
}

/// POST /api/v1/documents
async fn create_document_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/v1/documents");

    let kind: DocumentKind = req.kind.parse().map_err(|e: docstream_core::api::UnknownKind| {
        state.record_error();
        HttpServerError::InvalidRequest(e.to_string())
    })?;
    if req.title.trim().is_empty() {
        state.record_error();
        return Err(HttpServerError::InvalidRequest("title must not be empty".into()));
    }
    if let Err(e) = state.services.coordinator.registry().resolve(kind) {
        state.record_error();
        return Err(e.into());
    }

    let request = CreateDocument {
        kind,
        title: req.title,
        owner_id: req.owner_id,
    };
    let coordinator = state.services.coordinator.clone();
    Ok(spawn_streaming(&state, "create", move |channel, cancel| async move {
        coordinator
            .create_document(request, &channel, &cancel)
            .await
    }))
}

/// POST /api/v1/documents/:id/update
async fn update_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/v1/documents/:id/update");

    if let Err(e) = state.services.coordinator.document(&id).await {
        state.record_error();
        return Err(e.into());
    }

    let request = UpdateDocument {
        id,
        description: req.description,
    };
    let coordinator = state.services.coordinator.clone();
    Ok(spawn_streaming(&state, "update", move |channel, cancel| async move {
        coordinator
            .update_document(request, &channel, &cancel)
            .await
    }))
}

/// GET /api/v1/documents/:id
async fn get_document_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, HttpServerError> {
    state.record_request("/api/v1/documents/:id");
    state
        .services
        .coordinator
        .document(&id)
        .await
        .map(Json)
        .map_err(|e| {
            state.record_error();
            e.into()
        })
}

/// GET /api/v1/documents/:id/versions
async fn list_versions_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Document>>, HttpServerError> {
    state.record_request("/api/v1/documents/:id/versions");
    state
        .services
        .coordinator
        .versions(&id)
        .await
        .map(Json)
        .map_err(|e| {
            state.record_error();
            e.into()
        })
}

/// POST /api/v1/operations/:op_id/cancel
async fn cancel_operation_handler(
    State(state): State<AppState>,
    Path(op_id): Path<String>,
) -> Result<Json<CancelResponse>, HttpServerError> {
    state.record_request("/api/v1/operations/:op_id/cancel");

    if !state.operations.cancel(&op_id) {
        state.record_error();
        return Err(HttpServerError::OperationNotFound(op_id));
    }
    tracing::info!(target: "docstream.http", operation_id = %op_id, "operation cancel requested");
    Ok(Json(CancelResponse {
        success: true,
        operation_id: op_id,
    }))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, requests_handled, errors_total, requests_by_endpoint) = {
        let stats = state
            .stats
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        (
            stats.uptime_seconds(),
            stats.requests_total,
            stats.errors_total,
            stats.requests_by_endpoint.clone(),
        )
    };

    Json(HealthResponse {
        status: "healthy".into(),
        session_id: state.session_id.clone(),
        uptime_seconds,
        requests_handled,
        errors_total,
        requests_by_endpoint,
        active_operations: state.operations.len(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /api/v1/shutdown
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let _ = state.shutdown_tx.send(());

    Json(serde_json::json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}

/// Registers a cancellable operation, runs it on its own task and returns
/// the SSE response that mirrors its live channel.
fn spawn_streaming<F, Fut>(state: &AppState, label: &'static str, run: F) -> Response
where
    F: FnOnce(LiveChannel, docstream_core::api::CancellationToken) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<Document, docstream_core::api::DocumentError>>
        + Send
        + 'static,
{
    let op_id = Uuid::new_v4().to_string();
    let cancel = state.operations.register(&op_id);
    let (channel, rx) = LiveChannel::bounded(state.stream.channel_capacity, state.stream.drop_when_full);

    let operations = state.operations.clone();
    let task_op_id = op_id.clone();
    tokio::spawn(async move {
        let result = run(channel, cancel).await;
        operations.finish(&task_op_id);
        match result {
            Ok(doc) => tracing::debug!(
                target: "docstream.http",
                operation_id = %task_op_id,
                op = label,
                document_id = %doc.id,
                "operation finished"
            ),
            Err(e) => tracing::debug!(
                target: "docstream.http",
                operation_id = %task_op_id,
                op = label,
                error = %e,
                "operation ended without a document"
            ),
        }
    });

    sse_response(&op_id, rx)
}

fn sse_response(op_id: &str, mut rx: mpsc::Receiver<StreamDelta>) -> Response {
    let events = async_stream::stream! {
        while let Some(delta) = rx.recv().await {
            match serde_json::to_string(&delta) {
                Ok(data) => yield Ok::<Event, Infallible>(Event::default().event(delta.type_tag()).data(data)),
                Err(e) => tracing::warn!(target: "docstream.http", error = %e, "failed to encode delta"),
            }
        }
    };

    let mut resp = Sse::new(events).keep_alive(KeepAlive::default()).into_response();
    if let Ok(value) = HeaderValue::from_str(op_id) {
        resp.headers_mut().insert(OPERATION_ID_HEADER, value);
    }
    resp
}
