//! HTTP request logging middleware.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use uuid::Uuid;

/// Logs every HTTP request at INFO level with a per-request id.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "HTTP request"
    );

    response
}
