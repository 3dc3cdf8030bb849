//! Post feed and author-scoped post editing.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    middleware::auth::Caller,
    models::{Post, PostFilter},
    routes::extract::{ApiJson, ApiQuery},
    routes::users::StatusResponse,
    AppState,
};

const MAX_PAGE_SIZE: u32 = 100;

/// Query string of `GET /api/index/posts`
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub keyword: Option<String>,
    pub user_id: Option<i64>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub username: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PostListQuery {
    fn into_filter(self) -> AppResult<PostFilter> {
        let defaults = PostFilter::default();

        let page = self.page.unwrap_or(defaults.page);
        if page == 0 {
            return Err(AppError::BadRequest("page must be at least 1".to_string()));
        }

        let page_size = self.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let date = match self.date.as_deref().filter(|d| !d.is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?,
            ),
            None => None,
        };

        Ok(PostFilter {
            keyword: self.keyword.filter(|k| !k.is_empty()),
            user_id: self.user_id,
            date,
            username: self.username.filter(|u| !u.is_empty()),
            page,
            page_size,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeletePostRequest {
    pub id: i64,
}

/// `GET /api/index/posts`
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let filter = query.into_filter()?;
    debug!(?filter, "Fetching posts");

    let posts = state.store.list_posts(&filter).await?;
    info!(count = posts.len(), page = filter.page, "Posts fetched");
    Ok(Json(posts))
}

/// `POST /api/index/posts/create`
#[instrument(skip_all, fields(caller = caller))]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> AppResult<Json<Post>> {
    if request.content.trim().is_empty() {
        return Err(AppError::BadRequest("Post content is required".to_string()));
    }

    let post = state.store.create_post(caller, &request.content).await?;
    info!(post_id = post.id, "Post created");
    Ok(Json(post))
}

/// `PUT /api/index/posts/update`
#[instrument(skip_all, fields(caller = caller, post_id = request.id))]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<UpdatePostRequest>,
) -> AppResult<Json<StatusResponse>> {
    if !state
        .store
        .update_post(request.id, caller, &request.content)
        .await?
    {
        warn!("Post not found or not owned by caller");
        return Err(AppError::Forbidden(
            "Post not found or you don't have permission to edit it".to_string(),
        ));
    }

    info!("Post updated");
    Ok(StatusResponse::success())
}

/// `DELETE /api/index/posts/delete`
#[instrument(skip_all, fields(caller = caller, post_id = request.id))]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<DeletePostRequest>,
) -> AppResult<Json<StatusResponse>> {
    if !state.store.delete_post(request.id, caller).await? {
        warn!("Post not found or not owned by caller");
        return Err(AppError::Forbidden(
            "Post not found or you don't have permission to delete it".to_string(),
        ));
    }

    info!("Post deleted");
    Ok(StatusResponse::success())
}
