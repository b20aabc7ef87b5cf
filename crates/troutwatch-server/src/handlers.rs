//! HTTP handlers for the dashboard server.
//!
//! All handlers receive the shared [`AppState`] via Axum's `State`
//! extractor. The JSON API reports failures as [`ServerApiError`]; the
//! `/run` and `/data.txt` endpoints keep the response shapes the
//! dashboard page and the producer tooling already rely on.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use troutwatch_core::reading::Reading;
use troutwatch_dashboard::{Message, TileSummary};

use crate::error::ServerApiError;
use crate::gate::GateState;
use crate::producer;
use crate::state::AppState;

/// Body of the 404 returned by `/data.txt`.
pub const DATA_FILE_MISSING: &str = "data.txt not found";
/// Body of the 500 returned by `/data.txt` when the file cannot be read.
pub const DATA_FILE_UNREADABLE: &str = "data.txt could not be read";

// ---------------------------------------------------------------------------
// Dashboard page
// ---------------------------------------------------------------------------

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Troutwatch</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 1rem; background: #f4f6f8; color: #222; }
        .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); grid-auto-rows: minmax(120px, auto); gap: 12px; }
        .tile { background: #fff; border-radius: 8px; padding: .6rem .8rem; box-shadow: 0 1px 3px rgba(0,0,0,.12); }
        .tile .header { display: flex; gap: .4rem; font-weight: 600; margin-bottom: .4rem; }
        .size-2x1, .size-2x2, .size-2x3 { grid-column: span 2; }
        .size-1x2, .size-2x2 { grid-row: span 2; }
        .size-1x3, .size-2x3 { grid-row: span 3; }
        .muted { color: #666; font-size: .85rem; }
        .value { font-size: 1.6rem; font-weight: 700; }
        .raw { font-family: monospace; }
    </style>
</head>
<body>
"#;

const PAGE_SCRIPT: &str = r#"<script>
(() => {
  const json = { 'Content-Type': 'application/json' };
  const reportVisibility = () =>
    fetch('/api/visibility', { method: 'PUT', headers: json, body: JSON.stringify({ visible: !document.hidden }) })
      .catch(() => {});

  const ensureTile = (grid, t) => {
    let el = document.getElementById(t.id);
    if (el) return el;
    el = document.createElement('section');
    el.id = t.id;
    el.className = `tile size-${t.size} s-${t.size}`;
    el.setAttribute('role', 'gridcell');
    el.setAttribute('aria-label', t.title);
    el.tabIndex = 0;
    const header = document.createElement('div');
    header.className = 'header';
    const icon = document.createElement('span');
    icon.className = 'icon';
    icon.setAttribute('aria-hidden', 'true');
    icon.textContent = t.icon;
    const title = document.createElement('span');
    title.className = 'title';
    title.textContent = t.title;
    header.append(icon, title);
    const body = document.createElement('div');
    body.className = 'body';
    el.append(header, body);
    grid.append(el);
    return el;
  };

  const refresh = () =>
    fetch('/api/tiles', { cache: 'no-store' })
      .then((r) => r.json())
      .then((tiles) => {
        const grid = document.getElementById('dashboard');
        for (const t of tiles) ensureTile(grid, t).querySelector('.body').innerHTML = t.body_html;
      })
      .catch(() => {});

  window.addEventListener('message', (e) => {
    const d = e.data;
    if (!d || d.type !== 'note') return;
    fetch('/api/messages', { method: 'POST', headers: json, body: JSON.stringify({ type: 'note', text: String(d.text) }) })
      .then(refresh)
      .catch(() => {});
  });

  document.addEventListener('visibilitychange', () => {
    reportVisibility();
    if (!document.hidden) refresh();
  });
  reportVisibility();
  setInterval(() => { if (!document.hidden) refresh(); }, __REFRESH_MS__);
})();
</script>
</body>
</html>
"#;

/// `GET /` -- the dashboard page, rendered from the current tiles.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let grid = state.dashboard.read().await.render_grid();
    let script = PAGE_SCRIPT.replace("__REFRESH_MS__", &state.refresh_interval_ms.to_string());

    let mut page = String::with_capacity(
        PAGE_HEAD
            .len()
            .saturating_add(grid.len())
            .saturating_add(script.len()),
    );
    page.push_str(PAGE_HEAD);
    page.push_str(&grid);
    page.push('\n');
    page.push_str(&script);
    Html(page)
}

// ---------------------------------------------------------------------------
// Data file
// ---------------------------------------------------------------------------

/// `GET /data.txt` -- the producer's last output.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
/// Only a missing file is a `404`; other read failures are a `500`.
pub async fn data_txt(State(state): State<Arc<AppState>>) -> Response {
    let text_plain = (header::CONTENT_TYPE, "text/plain; charset=utf-8");
    match tokio::fs::read(&state.data_file).await {
        Ok(bytes) => (
            [text_plain, (header::CACHE_CONTROL, "no-store")],
            String::from_utf8_lossy(&bytes).into_owned(),
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %state.data_file.display(), "data file missing");
            (StatusCode::NOT_FOUND, [text_plain], DATA_FILE_MISSING).into_response()
        }
        Err(e) => {
            warn!(path = %state.data_file.display(), error = %e, "data file unreadable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [text_plain],
                DATA_FILE_UNREADABLE,
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Producer trigger
// ---------------------------------------------------------------------------

/// Response body of `GET /run`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum RunResponse {
    /// The producer ran and its data file was read.
    Ok {
        /// Parsed readings.
        readings: Vec<Reading>,
        /// Data file contents.
        raw: String,
    },
    /// Another run is in progress.
    Running {
        /// Explanation.
        message: String,
    },
    /// The run failed.
    Error {
        /// What went wrong.
        message: String,
        /// Captured standard error, when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
        /// Captured standard output, when available.
        #[serde(skip_serializing_if = "Option::is_none")]
        stdout: Option<String>,
    },
}

/// `GET /run` -- run the producer once and return what it wrote.
///
/// Single-flight: a trigger while a run is in progress gets `409`
/// without starting anything.
pub async fn run(State(state): State<Arc<AppState>>) -> (StatusCode, Json<RunResponse>) {
    let Ok(_permit) = state.run_gate.try_acquire() else {
        info!("producer trigger rejected, run in progress");
        return (
            StatusCode::CONFLICT,
            Json(RunResponse::Running {
                message: "producer is already running".to_owned(),
            }),
        );
    };

    match producer::collect(&state.producer, &state.data_file).await {
        Ok(collected) => {
            info!(readings = collected.readings.len(), "producer run complete");
            (
                StatusCode::OK,
                Json(RunResponse::Ok {
                    readings: collected.readings,
                    raw: collected.raw,
                }),
            )
        }
        Err(e) => {
            warn!(error = %e, "producer run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunResponse::Error {
                    message: e.to_string(),
                    stderr: e.stderr().map(str::to_owned),
                    stdout: e.stdout().map(str::to_owned),
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

/// `GET /api/tiles` -- every tile in grid order.
pub async fn list_tiles(State(state): State<Arc<AppState>>) -> Json<Vec<TileSummary>> {
    Json(state.dashboard.read().await.summaries())
}

/// `GET /api/tiles/{id}` -- one tile.
pub async fn get_tile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TileSummary>, ServerApiError> {
    let dashboard = state.dashboard.read().await;
    dashboard
        .tiles()
        .get(&id)
        .map(|tile| Json(TileSummary::from(tile)))
        .ok_or_else(|| ServerApiError::NotFound(format!("tile {id} not found")))
}

/// Response of `POST /api/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAck {
    /// Whether a handler consumed the message.
    pub accepted: bool,
}

/// `POST /api/messages` -- deliver a cross-frame message envelope.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<Message>,
) -> Result<Json<MessageAck>, ServerApiError> {
    if message.kind.trim().is_empty() {
        return Err(ServerApiError::BadRequest(
            "message type must not be empty".to_owned(),
        ));
    }
    let accepted = state.dashboard.write().await.post_message(&message);
    Ok(Json(MessageAck { accepted }))
}

/// Body of `PUT /api/visibility`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilityUpdate {
    /// Whether the page is visible.
    pub visible: bool,
}

/// Response of `PUT /api/visibility`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilityChange {
    /// New state.
    pub visible: bool,
    /// State before the update.
    pub previous: bool,
}

/// `PUT /api/visibility` -- pause or resume refresh cycles.
pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Json(update): Json<VisibilityUpdate>,
) -> Json<VisibilityChange> {
    let previous = state.visibility.set_visible(update.visible);
    if previous != update.visible {
        info!(visible = update.visible, "page visibility changed");
    }
    Json(VisibilityChange {
        visible: update.visible,
        previous,
    })
}

/// Response of `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Producer gate state.
    pub producer: GateState,
    /// Whether refresh cycles are running.
    pub visible: bool,
    /// Number of tiles on the dashboard.
    pub tiles: usize,
    /// Number of notes received.
    pub notes: usize,
}

/// `GET /api/status` -- gate and dashboard counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let dashboard = state.dashboard.read().await;
    Json(StatusResponse {
        producer: state.run_gate.state(),
        visible: state.visibility.is_visible(),
        tiles: dashboard.tiles().len(),
        notes: dashboard.notes().notes().len(),
    })
}
