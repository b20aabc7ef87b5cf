//! Axum router construction for the dashboard server.
//!
//! Assembles all routes into a single [`Router`] with CORS and HTTP
//! tracing middleware, and falls back to static files from the public
//! directory for everything else.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the dashboard server.
///
/// The router includes:
/// - `GET /` -- dashboard page
/// - `GET /data.txt` -- raw data file
/// - `GET /run` -- trigger the data producer
/// - `GET /api/tiles` -- list tiles
/// - `GET /api/tiles/{id}` -- single tile
/// - `GET /api/status` -- gate and dashboard counters
/// - `POST /api/messages` -- cross-frame message envelope
/// - `PUT /api/visibility` -- page visibility report
/// - anything else -- static file from `public_dir`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.public_dir);

    Router::new()
        // Page
        .route("/", get(handlers::index))
        // Producer
        .route("/data.txt", get(handlers::data_txt))
        .route("/run", get(handlers::run))
        // JSON API
        .route("/api/tiles", get(handlers::list_tiles))
        .route("/api/tiles/{id}", get(handlers::get_tile))
        .route("/api/status", get(handlers::status))
        .route("/api/messages", post(handlers::post_message))
        .route("/api/visibility", put(handlers::set_visibility))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
