//! HTTP server for the Troutwatch dashboard.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Dashboard page** (`GET /`) rendered from the shared tile registry
//! - **Data file** (`GET /data.txt`) as written by the data producer
//! - **Producer trigger** (`GET /run`), single-flight with a watchdog
//!   timeout
//! - **JSON API** for tiles, cross-frame messages, and page visibility
//! - **Static files** from the public directory for everything else
//!
//! # Architecture
//!
//! The server owns no refresh logic. A
//! [`SensorTileController`](troutwatch_dashboard::SensorTileController)
//! task writes into the same [`SharedDashboard`](troutwatch_dashboard::SharedDashboard)
//! that the handlers read, and the page reports its visibility back so
//! the controller can idle while nobody is looking.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod producer;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use gate::{GateError, GateState, RunGate, RunPermit};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{RunningServer, StartupError, spawn_server};
pub use state::AppState;
