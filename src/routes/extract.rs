//! Extractors whose rejections render as [`AppError`] JSON bodies.

use axum::extract::{
    multipart::{MultipartError, MultipartRejection},
    rejection::{JsonRejection, QueryRejection},
    FromRequest, FromRequestParts,
};
use tracing::debug;

use crate::error::AppError;

/// `axum::Json` with a 400 "Invalid JSON format" rejection
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with a 400 rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected JSON body");
        AppError::BadRequest("Invalid JSON format".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected query string");
        AppError::BadRequest("Invalid query parameters".to_string())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected multipart body");
        AppError::BadRequest("Failed to parse form".to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        debug!(error = %err, "Malformed multipart field");
        AppError::BadRequest("Failed to parse form".to_string())
    }
}
