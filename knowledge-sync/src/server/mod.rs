//! HTTP status server exposing stats and health.

pub mod handlers;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::sync::broadcast;
use tracing::info;

use crate::monitoring::PipelineMonitor;
use crate::SyncError;

/// Create the status router.
pub fn create_app(monitor: PipelineMonitor) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::stats))
        .with_state(monitor)
}

/// Serve `app` on `addr` until `shutdown` fires.
pub async fn run_server(
    app: Router,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), SyncError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SyncError::server(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Status server listening on {}", addr);
    info!("- Health endpoint: http://{}/health", addr);
    info!("- Stats endpoint: http://{}/stats", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(|e| SyncError::server(e.to_string()))?;
    Ok(())
}
