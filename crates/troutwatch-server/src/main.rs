//! Troutwatch server binary.
//!
//! Wires the dashboard, its refresh controller, and the HTTP server
//! together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `$TROUTWATCH_CONFIG` or `troutwatch.yaml`
//! 3. Create the shared dashboard and application state
//! 4. Spawn the sensor refresh loop
//! 5. Serve HTTP until a shutdown signal arrives
//! 6. Stop the refresh loop and log the result

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use troutwatch_core::config::{ConfigError, TroutwatchConfig};
use troutwatch_dashboard::{Dashboard, RefreshTiming, SensorTileController};
use troutwatch_server::{AppState, ServerConfig, ServerError, start_server};

/// Config file read when `TROUTWATCH_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "troutwatch.yaml";

/// Top-level error for the server binary.
#[derive(Debug, thiserror::Error)]
enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The dashboard data source could not be built.
    #[error("data source error: {message}")]
    Source {
        /// Description of the failure.
        message: String,
    },

    /// The HTTP server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, data source setup, or the HTTP
/// server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("troutwatch starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        data_file = %config.server.data_file.display(),
        producer = %config.producer.program,
        refresh_interval_ms = config.dashboard.refresh_interval_ms,
        alerts = config.dashboard.alerts.len(),
        "Configuration loaded"
    );

    // 3. Shared dashboard and application state.
    let dashboard = Dashboard::new().into_shared();
    let state = Arc::new(AppState::with_dashboard(&config, Arc::clone(&dashboard)));

    // 4. Sensor refresh loop.
    let controller = SensorTileController::from_config(&config, dashboard).map_err(|e| {
        AppError::Source {
            message: e.to_string(),
        }
    })?;
    let (stop_tx, stop_rx) = watch::channel(false);
    let refresh = tokio::spawn(controller.run(
        Arc::clone(&state.visibility),
        RefreshTiming::from_config(&config.dashboard),
        stop_rx,
    ));

    // 5. Serve until Ctrl-C.
    let server_config = ServerConfig::from(&config.server);
    let served = start_server(&server_config, state, shutdown_signal()).await;

    // 6. Stop the refresh loop.
    if stop_tx.send(true).is_err() {
        warn!("refresh loop already stopped");
    }
    if let Err(e) = refresh.await {
        warn!(error = %e, "refresh loop task failed");
    }

    served.map_err(AppError::from)?;
    info!("troutwatch shutdown complete");
    Ok(())
}

/// Load configuration.
///
/// An explicit `TROUTWATCH_CONFIG` must point at a readable file. Without
/// it, `troutwatch.yaml` in the working directory is used if present and
/// defaults (plus environment overrides) otherwise.
fn load_config() -> Result<TroutwatchConfig, AppError> {
    if let Some(path) = std::env::var_os("TROUTWATCH_CONFIG") {
        return Ok(TroutwatchConfig::from_file(&PathBuf::from(path))?);
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(TroutwatchConfig::from_file(&default_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(TroutwatchConfig::parse("")?)
    }
}

/// Resolves on `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
