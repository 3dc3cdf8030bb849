//! Account endpoints: registration, login, email verification and the
//! caller's profile.

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, http::StatusCode, Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    middleware::auth::Caller,
    models::{NewUser, Post, User},
    routes::extract::{ApiJson, ApiQuery},
    validation::{is_alpha, is_valid_email},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub user: RegisteredUser,
    /// False when the verification mail could not be handed to the relay
    pub verification_email_sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub token: String,
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: u32,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Json<Self> {
        Json(Self { status: "success" })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Hash `password` off the async runtime.
pub(crate) async fn hash_password(state: &AppState, password: String) -> AppResult<String> {
    let hasher = state.passwords;
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")?;
    Ok(digest)
}

/// `POST /api/register`
///
/// Creates an inactive account and mails a 4-digit verification code. No
/// token is issued until the address is verified.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    if !is_valid_email(&request.email) || !is_alpha(&request.username) || request.password.is_empty()
    {
        warn!(username = %request.username, "Invalid registration input");
        return Err(AppError::BadRequest("Invalid input format".to_string()));
    }

    let password_hash = hash_password(&state, request.password).await?;

    let user = state
        .store
        .create_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            is_admin: false,
            is_active: false,
        })
        .await?;

    let code: u32 = rand::rng().random_range(1000..=9999);
    state.store.save_verification_code(&user.email, code).await?;

    info!(user_id = user.id, username = %user.username, "User registered");

    let verification_email_sent = match state
        .mailer
        .send(
            &user.email,
            "Verification Code",
            &format!("Verify your email via this 4-digit code: {}", code),
            None,
        )
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Failed to send verification email");
            false
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success",
            user: RegisteredUser {
                id: user.id,
                username: user.username,
                email: user.email,
            },
            verification_email_sent,
        }),
    ))
}

/// `POST /api/login`
#[instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let Some(credentials) = state.store.find_credentials(&request.email).await? else {
        warn!("Login for unknown email");
        return Err(invalid());
    };

    let hasher = state.passwords;
    let digest = credentials.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&request.password, &digest))
        .await
        .context("password verification task failed")?
        .context("stored password hash is malformed")?;

    if !matches {
        warn!(user_id = credentials.id, "Login with wrong password");
        return Err(invalid());
    }

    if !credentials.is_active {
        return Err(AppError::BadRequest("Email not verified".to_string()));
    }

    let token = state
        .tokens
        .issue(credentials.id, credentials.is_admin)
        .context("failed to sign token")?;

    info!(user_id = credentials.id, is_admin = credentials.is_admin, "User logged in");

    Ok(Json(LoginResponse {
        status: "success",
        token,
        user_id: credentials.id,
        is_admin: credentials.is_admin,
    }))
}

/// `POST /api/verify`
#[instrument(skip_all, fields(email = %request.email))]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> AppResult<Json<StatusResponse>> {
    if !state.store.activate(&request.email, request.code).await? {
        warn!("Invalid verification code");
        return Err(AppError::NotFound("Invalid verification code".to_string()));
    }

    info!("User verified");
    Ok(StatusResponse::success())
}

/// `GET /api/index/users`
pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    let users = state.store.list_users().await?;
    info!(count = users.len(), "Users fetched");
    Ok(Json(users))
}

/// `GET /api/user-profile/data?id=`
pub async fn profile_data(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> AppResult<Json<ProfileData>> {
    let user = state
        .store
        .get_user(query.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileData {
        username: user.username,
        email: user.email,
        is_admin: user.is_admin,
    }))
}

/// `POST /api/user-profile/edit`
///
/// Changes the caller's own username and password.
#[instrument(skip_all, fields(caller = caller))]
pub async fn profile_edit(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    ApiJson(request): ApiJson<ProfileUpdateRequest>,
) -> AppResult<Json<MessageResponse>> {
    if request.id == 0 || request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    if !is_alpha(&request.username) {
        return Err(AppError::BadRequest("Invalid username format".to_string()));
    }

    if request.id != caller {
        warn!(target_id = request.id, "Attempt to edit another user's profile");
        return Err(AppError::Forbidden(
            "You can only edit your own profile".to_string(),
        ));
    }

    let password_hash = hash_password(&state, request.password).await?;

    if !state
        .store
        .update_profile(request.id, &request.username, &password_hash)
        .await?
    {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    info!(username = %request.username, "Profile updated");
    Ok(Json(MessageResponse {
        message: "User updated successfully",
    }))
}

/// `GET /api/user-profile/posts?id=`
pub async fn profile_posts(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let posts = state.store.user_posts(query.id).await?;
    info!(user_id = query.id, count = posts.len(), "User posts fetched");
    Ok(Json(posts))
}
