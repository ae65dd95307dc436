use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Logs one line per request; client and server errors log at warn so
/// failed turns stand out in the default filter.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_client_error() || status.is_server_error() {
        tracing::warn!(%method, %path, %status, duration_ms, "request failed");
    } else {
        tracing::info!(%method, %path, %status, duration_ms, "request handled");
    }

    response
}
