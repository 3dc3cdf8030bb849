//! Middleware module
//!
//! Contains the axum middleware for request logging, rate limiting,
//! authentication gates and panic recovery.

pub mod auth;
pub mod logging;
pub mod rate_limiter;
pub mod recover;

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, extract::Request};

/// Client address used as the rate-limit key and in request logs.
///
/// Falls back to `"unknown"` when the server was not started with connect
/// info (e.g. in-process test servers).
pub fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
