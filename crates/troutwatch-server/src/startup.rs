//! Background startup helper for the dashboard server.
//!
//! [`spawn_server`] binds the listener on the caller's task, so address
//! and port problems surface before anything is spawned, then serves on
//! a background Tokio task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the dashboard server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// Address actually bound (resolves port `0`).
    pub addr: SocketAddr,
    /// Task serving requests; completes after graceful shutdown.
    pub handle: JoinHandle<()>,
}

/// Bind and spawn the dashboard server.
///
/// The server stops accepting connections once `shutdown` resolves.
pub async fn spawn_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<RunningServer, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "dashboard server exited with error");
        }
    });

    tracing::info!(%addr, "dashboard server spawned on background task");

    Ok(RunningServer { addr, handle })
}
