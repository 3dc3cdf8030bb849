//! HTTP routes for Agora
//!
//! This module defines all HTTP endpoints exposed by the server.

pub mod admin;
pub mod comments;
pub mod extract;
pub mod health;
pub mod metrics;
pub mod posts;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    middleware::{
        auth::{require, AdminOnly, JwtRequired},
        logging::request_logging,
        rate_limiter::rate_limit_middleware,
        recover::handle_panic,
    },
    AppState,
};

/// Routes that need any valid token
fn member_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/index/users", get(users::list_users))
        .route("/api/index/posts", get(posts::list_posts))
        .route("/api/index/posts/create", post(posts::create_post))
        .route("/api/index/posts/update", put(posts::update_post))
        .route("/api/index/posts/delete", delete(posts::delete_post))
        .route("/api/index/comments", get(comments::list_comments))
        .route("/api/index/comments/create", post(comments::create_comment))
        .route("/api/index/comments/update", put(comments::update_comment))
        .route("/api/index/comments/delete", delete(comments::delete_comment))
        .route("/api/user-profile/data", get(users::profile_data))
        .route("/api/user-profile/edit", post(users::profile_edit))
        .route("/api/user-profile/posts", get(users::profile_posts))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require::<JwtRequired>,
        ))
}

/// Routes that need a token with the admin flag
fn admin_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/delete", delete(admin::delete_user))
        .route("/api/admin/users/edit", post(admin::edit_user))
        .route(
            "/api/admin/broadcast-to-selected",
            post(admin::broadcast_to_selected)
                .layer(DefaultBodyLimit::max(admin::BROADCAST_BODY_LIMIT)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require::<AdminOnly>,
        ))
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/verify", post(users::verify))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    // Layers wrap outward: the last one added sees the request first.
    Router::new()
        .merge(public_routes)
        .merge(member_routes(&state))
        .merge(admin_routes(&state))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
