//! Serving loop and graceful shutdown

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{routes, AppState};

/// Serve until `signal` resolves or the server stops on its own.
///
/// In-flight requests get `shutdown_grace` to finish after the signal.
/// Background broadcasts are drained before this returns, on every path.
pub async fn serve(
    state: Arc<AppState>,
    listener: TcpListener,
    signal: impl Future<Output = ()>,
) -> Result<()> {
    let app = routes::create_router(state.clone());

    let shutdown = CancellationToken::new();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.clone().cancelled_owned())
    .into_future();
    let mut server = tokio::spawn(server);

    let stopped_early = tokio::select! {
        _ = signal => None,
        joined = &mut server => Some(joined),
    };

    let result = match stopped_early {
        Some(joined) => {
            warn!("Server stopped without a shutdown signal");
            flatten(joined)
        }
        None => {
            shutdown.cancel();
            info!(
                grace_seconds = state.config.shutdown_grace.as_secs(),
                "Draining in-flight requests"
            );

            match tokio::time::timeout(state.config.shutdown_grace, &mut server).await {
                Ok(joined) => flatten(joined),
                Err(_) => {
                    warn!("Grace period elapsed, aborting remaining connections");
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    state.broadcaster.shutdown().await;
    result
}

fn flatten(joined: Result<std::io::Result<()>, JoinError>) -> Result<()> {
    Ok(joined??)
}
