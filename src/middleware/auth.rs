//! Authentication middleware
//!
//! Validates `Authorization: Bearer <token>` headers against the token
//! service and enforces per-route gates before a request reaches its handler.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    auth::{Claims, TokenService},
    error::AppError,
    routes::metrics,
    AppState,
};

/// Why a request failed authentication or authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Admin access required")]
    AdminRequired,
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::AdminRequired => "admin_required",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => AppError::Unauthorized(err.to_string()),
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::AdminRequired => AppError::Forbidden(err.to_string()),
        }
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Run header extraction and token verification, returning the claims.
pub fn verify_request(headers: &HeaderMap, tokens: &TokenService) -> Result<Claims, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    if value.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    let token = extract_bearer_token(value).ok_or(AuthError::InvalidToken)?;

    tokens.verify(token).map_err(|e| {
        debug!(reason = %e, "Token verification failed");
        AuthError::InvalidToken
    })
}

/// Resolve the calling user's id without gating the request.
///
/// Handlers decide which status to answer with on failure.
pub fn identify(headers: &HeaderMap, tokens: &TokenService) -> Result<i64, AuthError> {
    verify_request(headers, tokens).map(|claims| claims.user_id)
}

/// Access policy applied to verified claims.
pub trait Gate: Send + Sync + 'static {
    const NAME: &'static str;

    fn authorize(claims: &Claims) -> Result<(), AuthError>;
}

/// Any validly signed, unexpired token passes.
pub struct JwtRequired;

impl Gate for JwtRequired {
    const NAME: &'static str = "jwt";

    fn authorize(_claims: &Claims) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Only tokens carrying the admin flag pass.
pub struct AdminOnly;

impl Gate for AdminOnly {
    const NAME: &'static str = "admin";

    fn authorize(claims: &Claims) -> Result<(), AuthError> {
        if claims.is_admin {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }
}

/// Gate middleware
///
/// Rejects the request with 401/403 before the handler runs, or inserts the
/// verified [`Claims`] into the request extensions and continues.
#[instrument(skip_all, fields(gate = G::NAME, path = %request.uri().path()))]
pub async fn require<G: Gate>(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_request(request.headers(), &state.tokens)
        .and_then(|claims| G::authorize(&claims).map(|_| claims))
        .map_err(|e| {
            warn!(reason = e.reason(), "Request rejected by gate");
            metrics::record_auth_rejection(G::NAME, e.reason());
            e
        })?;

    debug!(user_id = claims.user_id, is_admin = claims.is_admin, "Request authenticated");

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Id of the authenticated caller.
///
/// Reuses claims left by a gate when present, otherwise verifies the
/// Authorization header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub i64);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(Caller(claims.user_id));
        }

        identify(&parts.headers, &state.tokens)
            .map(Caller)
            .map_err(|e| {
                warn!(reason = e.reason(), "Unauthorized access attempt");
                AppError::from(e)
            })
    }
}
