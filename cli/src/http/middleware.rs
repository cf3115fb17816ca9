//! Cross-cutting layers: localhost-only CORS, a deadline for the plain JSON
//! routes, and one access log line per request.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::http::routes::OPERATION_ID_HEADER;

/// Deadline for routes that answer with a single JSON body.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(30);

const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// `scheme://host[:port]` where host is a loopback name.
fn is_local_origin(origin: &str) -> bool {
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let host = match rest.strip_prefix("[::1]") {
        Some(port) => return port.is_empty() || is_port_suffix(port),
        None => rest.split(':').next().unwrap_or_default(),
    };
    let port = &rest[host.len()..];
    LOCAL_HOSTS.contains(&host) && (port.is_empty() || is_port_suffix(port))
}

fn is_port_suffix(s: &str) -> bool {
    s.strip_prefix(':')
        .is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(is_local_origin)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::CACHE_CONTROL])
        .expose_headers([HeaderName::from_static(OPERATION_ID_HEADER)])
        .max_age(Duration::from_secs(600))
}

/// Applied with `route_layer` to the non-streaming routes only. An SSE
/// response lives as long as its operation and must not be cut off here.
pub fn deadline_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::new(limit)
}

pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    let operation_id = response
        .headers()
        .get(OPERATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let streaming = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"text/event-stream"));

    if response.status().is_client_error() || response.status().is_server_error() {
        tracing::warn!(
            target: "docstream.http",
            %method,
            %path,
            status,
            elapsed_ms,
            "request rejected"
        );
    } else if let (true, Some(operation_id)) = (streaming, operation_id) {
        tracing::info!(
            target: "docstream.http",
            %method,
            %path,
            %operation_id,
            "delta stream opened"
        );
    } else {
        tracing::debug!(
            target: "docstream.http",
            %method,
            %path,
            status,
            elapsed_ms,
            "request served"
        );
    }

    response
}
