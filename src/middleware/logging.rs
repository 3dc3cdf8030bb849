//! Request logging middleware.
//!
//! Logs every HTTP request on arrival (method, path, client address, user
//! agent) and on completion (status, latency). Observability only: the
//! request and response pass through untouched.

use std::time::Instant;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::{middleware::client_addr, routes::metrics};

/// Paths excluded from request logs to reduce noise
fn is_quiet_path(path: &str) -> bool {
    path.starts_with("/health") || path == "/metrics"
}

/// Middleware that logs HTTP requests with timing information.
///
/// Logs at INFO level on completion, WARN level for 5xx responses.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    if is_quiet_path(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let client = client_addr(&request);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        info!(client_ip = %client, user_agent = %user_agent, "Incoming request");

        let start = Instant::now();
        let response = next.run(request).await;
        let latency = start.elapsed();
        let status = response.status().as_u16();

        if status >= 500 {
            warn!(status, duration_ms = latency.as_millis() as u64, "Request failed (5xx)");
        } else {
            info!(status, duration_ms = latency.as_millis() as u64, "Request completed");
        }

        metrics::record_request(method.as_str(), status, latency.as_secs_f64());

        response
    }
    .instrument(span)
    .await
}
