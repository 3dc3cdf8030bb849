//! Comment endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    middleware::auth::Caller,
    models::Comment,
    routes::extract::ApiJson,
    routes::users::StatusResponse,
    store::StoreError,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommentRequest {
    pub id: i64,
}

/// `GET /api/index/comments`
pub async fn list_comments(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Comment>>> {
    let comments = state.store.list_comments().await?;
    info!(count = comments.len(), "Comments fetched");
    Ok(Json(comments))
}

/// `POST /api/index/comments/create`
#[instrument(skip_all, fields(caller = caller, post_id = request.post_id))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> AppResult<Json<Comment>> {
    if request.content.trim().is_empty() {
        return Err(AppError::BadRequest("Comment content is required".to_string()));
    }

    let comment = state
        .store
        .create_comment(request.post_id, caller, &request.content)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("Post not found".to_string()),
            other => other.into(),
        })?;

    info!(comment_id = comment.id, "Comment created");
    Ok(Json(comment))
}

/// `PUT /api/index/comments/update`
#[instrument(skip_all, fields(caller = caller, comment_id = request.id))]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<UpdateCommentRequest>,
) -> AppResult<Json<StatusResponse>> {
    if !state
        .store
        .update_comment(request.id, caller, &request.content)
        .await?
    {
        warn!("Comment not found or not owned by caller");
        return Err(AppError::Forbidden(
            "Comment not found or you don't have permission to edit it".to_string(),
        ));
    }

    info!("Comment updated");
    Ok(StatusResponse::success())
}

/// `DELETE /api/index/comments/delete`
///
/// Allowed for the comment's author and for the author of the post.
#[instrument(skip_all, fields(caller = caller, comment_id = request.id))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<DeleteCommentRequest>,
) -> AppResult<Json<StatusResponse>> {
    if !state.store.delete_comment(request.id, caller).await? {
        warn!("Comment not found or caller may not delete it");
        return Err(AppError::Forbidden(
            "Comment not found or you don't have permission to delete it".to_string(),
        ));
    }

    info!("Comment deleted");
    Ok(StatusResponse::success())
}
