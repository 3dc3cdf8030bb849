//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!("agora_requests_total", "Total number of HTTP requests served");
    metrics::describe_histogram!(
        "agora_request_duration_seconds",
        "Request duration in seconds"
    );
    metrics::describe_counter!(
        "agora_rate_limited_total",
        "Requests rejected by the per-client rate limiter"
    );
    metrics::describe_counter!(
        "agora_auth_rejections_total",
        "Requests rejected by an authentication gate"
    );
    metrics::describe_counter!(
        "agora_broadcast_emails_total",
        "Broadcast emails attempted, by outcome"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a completed request
pub fn record_request(method: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "agora_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("agora_request_duration_seconds").record(duration_secs);
}

pub fn record_rate_limited() {
    metrics::counter!("agora_rate_limited_total").increment(1);
}

pub fn record_auth_rejection(gate: &'static str, reason: &'static str) {
    metrics::counter!("agora_auth_rejections_total", "gate" => gate, "reason" => reason)
        .increment(1);
}

/// Record one broadcast delivery; `outcome` is `sent` or `failed`
pub fn record_broadcast_email(outcome: &'static str) {
    metrics::counter!("agora_broadcast_emails_total", "outcome" => outcome).increment(1);
}
