//! Observer server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_observer`] which launches the observer HTTP +
//! `WebSocket` server on a background Tokio task. The engine binary calls
//! this during startup so the observer API runs concurrently with the
//! round loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::router::build_router;
use crate::server::ServerConfig;
use crate::state::AppState;

/// Errors that can occur when spawning the observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The listener could not bind to the requested address.
    #[error("observer bind error: {0}")]
    Bind(String),
}

/// Bind the observer server and serve it from a background task.
///
/// The bind happens eagerly so an unusable address fails startup fast;
/// only the serve loop runs on the spawned task. The returned handle can
/// be awaited on shutdown, though the serve loop normally outlives the
/// round loop and dies with the process.
///
/// # Errors
///
/// Returns [`StartupError::Bind`] if the address cannot be parsed or the
/// TCP listener cannot bind.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| StartupError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Observer server listening");

    let router = build_router(state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Observer server terminated");
        }
    });

    Ok(handle)
}
