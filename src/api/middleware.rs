//! API Middleware
//!
//! Request logging with correlation IDs.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Correlation ID for request tracing, honored from the client when present
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

/// Extract the correlation ID from the X-Correlation-Id header, or
/// generate a new one
fn correlation_id_from(headers: &HeaderMap) -> Uuid {
    headers
        .get("X-Correlation-Id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Request logging middleware
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let correlation_id = correlation_id_from(request.headers());
    request.extensions_mut().insert(CorrelationId(correlation_id));

    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = %correlation_id,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}
