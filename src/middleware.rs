//! Request-scoped middleware: correlation IDs and access logging

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Tag every request with an `x-request-id`, honoring one supplied by the
/// caller. The ID rides in request extensions and is echoed on the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(id.clone());
    let mut response = next.run(request).await;
    if let Ok(value) = id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Structured access log: one entry at dispatch, one at completion with
/// status and latency.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let id = request
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_default();
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, request_id = %id, "request started");

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        latency_ms = %start.elapsed().as_millis(),
        request_id = %id,
        "request completed"
    );

    response
}
