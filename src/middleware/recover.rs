//! Converts handler panics into 500 responses.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::error::{ErrorBody, ErrorResponse};

/// Panic handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(panic = %detail, "Handler panicked");

    let body = ErrorResponse {
        error: ErrorBody {
            code: "INTERNAL_ERROR".to_string(),
            message: "Internal server error".to_string(),
        },
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
