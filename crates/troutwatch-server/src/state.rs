//! Shared application state for the dashboard server.
//!
//! [`AppState`] is wrapped in [`Arc`] and injected via Axum's `State`
//! extractor. The dashboard itself sits behind a tokio `RwLock`: the
//! refresh task and the notes handler write, page and JSON handlers
//! read. The run and visibility gates are lock-free.

use std::path::PathBuf;
use std::sync::Arc;

use troutwatch_core::config::{ProducerConfig, TroutwatchConfig};
use troutwatch_dashboard::{Dashboard, SharedDashboard, VisibilityGate};

use crate::gate::RunGate;

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tiles and notes.
    pub dashboard: SharedDashboard,
    /// Whether a dashboard page is visible; gates refresh cycles.
    pub visibility: Arc<VisibilityGate>,
    /// Single-flight guard for `/run`.
    pub run_gate: Arc<RunGate>,
    /// How to launch the data producer.
    pub producer: ProducerConfig,
    /// File the producer writes and `/data.txt` serves.
    pub data_file: PathBuf,
    /// Directory served for unmatched paths.
    pub public_dir: PathBuf,
    /// Client-side tile polling period, in milliseconds.
    pub refresh_interval_ms: u64,
}

impl AppState {
    /// State for `config` with an empty dashboard.
    pub fn new(config: &TroutwatchConfig) -> Self {
        Self::with_dashboard(config, Dashboard::new().into_shared())
    }

    /// State for `config` around an existing dashboard.
    pub fn with_dashboard(config: &TroutwatchConfig, dashboard: SharedDashboard) -> Self {
        Self {
            dashboard,
            visibility: Arc::new(VisibilityGate::default()),
            run_gate: Arc::new(RunGate::new()),
            producer: config.producer.clone(),
            data_file: config.server.data_file.clone(),
            public_dir: config.server.public_dir.clone(),
            refresh_interval_ms: config.dashboard.refresh_interval_ms,
        }
    }
}
