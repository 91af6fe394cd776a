pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod telemetry;

pub use bootstrap::bootstrap;
pub use error::{ApiError, ErrorBody};
pub use rest::build_router;
pub use state::AppState;

use mapstore_core::{CoreError, CoreResult, MapstoreConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Boots the mapstore REST API and serves until Ctrl-C or SIGTERM.
pub async fn run_server(config: MapstoreConfig) -> CoreResult<()> {
    let (state, _operator) = bootstrap(&config).await?;
    let store = state.store.clone();

    let app = build_router(state);

    let addr: SocketAddr = config.server.bind_address.parse().map_err(|e| {
        CoreError::invalid(format!(
            "Invalid bind address '{}': {}",
            config.server.bind_address, e
        ))
    })?;

    info!("Starting mapstore API server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CoreError::internal_with(format!("Failed to bind to {addr}"), e))?;

    info!("Server successfully bound to {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::internal_with("Server error", e))?;

    store.close();
    info!("mapstore API server shutdown complete");
    Ok(())
}

/// Resolves on the first Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
    }
}
