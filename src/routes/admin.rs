//! Admin dashboard endpoints. Every route here sits behind the admin gate.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    broadcast::BroadcastJob,
    error::{AppError, AppResult},
    mail::Attachment,
    models::{AdminStats, User},
    routes::extract::{ApiJson, ApiQuery},
    routes::users::{IdQuery, MessageResponse},
    validation::{is_alpha, is_valid_email},
    AppState,
};

/// Upper bound on a broadcast form, attachment included
pub const BROADCAST_BODY_LIMIT: usize = 10 << 20;

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> AppResult<Json<AdminStats>> {
    let stats = state.store.stats().await?;
    info!(
        total_users = stats.total_users,
        total_posts = stats.total_posts,
        total_comments = stats.total_comments,
        active_users_24h = stats.active_users_24h,
        "Admin stats fetched"
    );
    Ok(Json(stats))
}

/// `GET /api/admin/users`
pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

/// `DELETE /api/admin/users/delete?id=`
#[instrument(skip_all, fields(user_id = query.id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> AppResult<Json<MessageResponse>> {
    if !state.store.delete_user(query.id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!("User deleted by admin");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

/// `POST /api/admin/users/edit`
#[instrument(skip_all, fields(user_id = request.id))]
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<EditUserRequest>,
) -> AppResult<Json<MessageResponse>> {
    if request.id == 0 || request.username.is_empty() || request.email.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    if !is_alpha(&request.username) {
        return Err(AppError::BadRequest("Invalid username format".to_string()));
    }
    if !is_valid_email(&request.email) {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }

    if !state
        .store
        .edit_user(request.id, &request.username, &request.email)
        .await?
    {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!("User edited by admin");
    Ok(Json(MessageResponse {
        message: "User updated successfully",
    }))
}

#[derive(Debug, Default)]
struct BroadcastForm {
    subject: String,
    body: String,
    users: Vec<String>,
    attachment: Option<Attachment>,
}

async fn read_broadcast_form(mut multipart: Multipart) -> AppResult<BroadcastForm> {
    let mut form = BroadcastForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "subject" => form.subject = field.text().await?,
            "body" => form.body = field.text().await?,
            "users[]" | "users" => form.users.push(field.text().await?),
            "attachment" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;

                // Browsers submit an empty part when no file was chosen.
                if !filename.is_empty() && !data.is_empty() {
                    form.attachment = Some(Attachment {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /api/admin/broadcast-to-selected`
///
/// Answers as soon as the broadcast is queued; delivery happens in the
/// background and survives until shutdown drains it.
pub async fn broadcast_to_selected(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<BroadcastResponse>> {
    let form = read_broadcast_form(multipart?).await?;

    if form.subject.trim().is_empty() {
        return Err(AppError::BadRequest("Subject is required".to_string()));
    }
    if form.users.is_empty() {
        return Err(AppError::BadRequest("No recipients selected".to_string()));
    }
    if let Some(bad) = form.users.iter().find(|u| !is_valid_email(u)) {
        warn!(recipient = %bad, "Broadcast rejected: invalid recipient");
        return Err(AppError::BadRequest(format!("Invalid recipient email: {}", bad)));
    }

    info!(
        subject = %form.subject,
        recipients = form.users.len(),
        attachment = form.attachment.as_ref().map(|a| a.filename.as_str()),
        "Broadcast queued"
    );

    // Completion is reported by the broadcaster's own log line.
    drop(state.broadcaster.dispatch(BroadcastJob {
        subject: form.subject,
        body: form.body,
        recipients: form.users,
        attachment: form.attachment,
    }));

    Ok(Json(BroadcastResponse {
        success: true,
        message: "Emails are being sent",
    }))
}
