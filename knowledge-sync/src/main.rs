//! Knowledge Sync Main Entry Point
//!
//! Consumes document change events from Kafka and keeps the OpenSearch document index
//! in sync with them.

use dotenv::dotenv;
use knowledge_sync::{server, Dependencies, SyncConfig, SyncError};
use std::env;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// JSON output when `LOG_FORMAT=json` or an `AXIOM_TOKEN` is present, pretty console
/// output otherwise.
fn init_tracing() -> Result<(), SyncError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("knowledge_sync=info,knowledge_sync_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
        || env::var("AXIOM_TOKEN").is_ok();

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| SyncError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "knowledge-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| SyncError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "knowledge-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Knowledge Sync");

    let config = SyncConfig::from_env()?;

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    // Status server runs until the consumer loop returns.
    let (server_shutdown_tx, server_shutdown_rx) = broadcast::channel::<()>(1);
    let app = server::create_app(deps.monitor.clone());
    let status_addr = deps.status_addr;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(app, status_addr, server_shutdown_rx).await {
            error!(error = %e, "Status server failed");
        }
    });

    let result = deps.consumer_loop.run().await;

    let _ = server_shutdown_tx.send(());
    let _ = server_handle.await;

    match result {
        Ok(()) => {
            info!("Knowledge sync stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Knowledge sync failed");
            Err(e.into())
        }
    }
}
