//! Sensor tile controller.
//!
//! Each refresh cycle fetches the sensor text, parses it, renders one tile
//! per reading and feeds the matched water/air readings into the alert
//! tiles. A failed fetch never escapes the cycle: the alerts fall back to
//! "no data" and the per-sensor tiles keep their last content.
//!
//! [`SensorTileController::run`] drives cycles on a timer: one after a
//! short startup delay, then one per interval while the page is visible.
//! Cycles run one at a time inside the loop task, and ticks that fire
//! while a cycle is still running are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use troutwatch_core::config::{DashboardConfig, TroutwatchConfig};
use troutwatch_core::reading::{Reading, parse_readings};
use troutwatch_core::zone::Zone;

use crate::alert::AlertTile;
use crate::board::SharedDashboard;
use crate::error::FetchError;
use crate::markup::Element;
use crate::registry::TileRegistry;
use crate::source::{DataSource, FileSource, HttpSource};
use crate::tile::TileSpec;
use crate::visibility::VisibilityGate;

/// Prefix of every per-sensor tile id.
pub const SENSOR_TILE_PREFIX: &str = "sensor-";
/// Glyph shown on per-sensor tiles.
pub const SENSOR_TILE_ICON: &str = "🌡";

// ---------------------------------------------------------------------------
// Tile ids
// ---------------------------------------------------------------------------

/// Stable tile id for a sensor name.
///
/// Lowercased, every run of characters outside `[a-z0-9]` collapsed to a
/// single `-`, leading/trailing dashes removed, `s-` prepended when the
/// result starts with a digit. A name with nothing left falls back to the
/// current time in base 36, which is *not* stable across cycles.
pub fn sensor_tile_id(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.starts_with(|c: char| c.is_ascii_digit()) {
        slug.insert_str(0, "s-");
    }
    if slug.is_empty() {
        let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        slug = base36(millis);
    }

    format!("{SENSOR_TILE_PREFIX}{slug}")
}

fn base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        let digit = n
            .checked_rem(36)
            .and_then(|d| u32::try_from(d).ok())
            .and_then(|d| char::from_digit(d, 36))
            .unwrap_or('0');
        digits.push(digit);
        n = n.checked_div(36).unwrap_or(0);
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// Render (or refresh) the tile for one reading. Returns `true` if the
/// tile was created by this call.
pub fn render_sensor_tile(registry: &mut TileRegistry, reading: &Reading) -> bool {
    let id = sensor_tile_id(&reading.name);
    let body = if reading.value.is_some() {
        Element::div().class("value").text(reading.display_text())
    } else {
        Element::div().class("raw").text(reading.raw.as_str())
    };

    if let Some(existing) = registry.body_mut(&id) {
        existing.set(body);
        return false;
    }

    let spec = TileSpec::new(id.as_str())
        .title(reading.name.as_str())
        .icon(SENSOR_TILE_ICON)
        .size("1x1");
    match registry.register_with(spec, |api| {
        api.set(body);
        Ok(())
    }) {
        Ok(handle) => handle.was_created(),
        Err(e) => {
            warn!(tile_id = %id, error = %e, "sensor tile not registered");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// How a refresh cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Readings were fetched and rendered.
    Rendered,
    /// The fetch failed; alerts show "no data".
    FetchFailed(String),
}

/// Summary of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of readings parsed.
    pub readings: usize,
    /// Sensor tiles created during this cycle.
    pub tiles_created: usize,
    /// Zone shown by each alert tile, by tile id.
    pub zones: Vec<(String, Zone)>,
    /// Overall result.
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// Zone shown by the alert tile `id`, if that alert exists.
    pub fn zone(&self, id: &str) -> Option<Zone> {
        self.zones.iter().find(|(z, _)| z == id).map(|(_, zone)| *zone)
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTiming {
    /// Delay before the first cycle.
    pub startup_delay: Duration,
    /// Period between cycles.
    pub interval: Duration,
}

impl RefreshTiming {
    /// Timing from the dashboard configuration section.
    pub const fn from_config(config: &DashboardConfig) -> Self {
        Self {
            startup_delay: Duration::from_millis(config.startup_delay_ms),
            interval: Duration::from_millis(config.refresh_interval_ms),
        }
    }
}

impl Default for RefreshTiming {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(200),
            interval: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Fetch / parse / render loop for the sensor and alert tiles.
#[derive(Debug, Clone)]
pub struct SensorTileController {
    source: DataSource,
    alerts: Vec<AlertTile>,
    dashboard: SharedDashboard,
}

impl SensorTileController {
    /// Create a controller.
    pub const fn new(source: DataSource, alerts: Vec<AlertTile>, dashboard: SharedDashboard) -> Self {
        Self {
            source,
            alerts,
            dashboard,
        }
    }

    /// Build the controller described by `config`.
    ///
    /// Reads `dashboard.source_url` over HTTP when set, otherwise the
    /// server's data file from disk.
    pub fn from_config(
        config: &TroutwatchConfig,
        dashboard: SharedDashboard,
    ) -> Result<Self, FetchError> {
        let source = match &config.dashboard.source_url {
            Some(url) => HttpSource::new(
                url.as_str(),
                Duration::from_millis(config.dashboard.fetch_timeout_ms),
            )?
            .into(),
            None => FileSource::new(config.server.data_file.clone()).into(),
        };
        let alerts = config
            .dashboard
            .alerts
            .iter()
            .map(AlertTile::from_config)
            .collect();
        Ok(Self::new(source, alerts, dashboard))
    }

    /// Data source in use.
    pub const fn source(&self) -> &DataSource {
        &self.source
    }

    /// Alert tiles in use.
    pub fn alerts(&self) -> &[AlertTile] {
        &self.alerts
    }

    /// Run one full cycle.
    pub async fn refresh(&self) -> CycleReport {
        let fetched = self.source.fetch_text().await;

        let mut dashboard = self.dashboard.write().await;
        let registry = dashboard.tiles_mut();

        match fetched {
            Ok(text) => {
                let readings = parse_readings(&text);
                let report = self.render_readings(registry, &readings);
                info!(
                    readings = report.readings,
                    tiles_created = report.tiles_created,
                    "refresh cycle complete"
                );
                report
            }
            Err(e) => {
                warn!(
                    source = self.source.name(),
                    error = %e,
                    "fetch failed, alerts set to no data"
                );
                CycleReport {
                    readings: 0,
                    tiles_created: 0,
                    zones: self.render_alerts(registry, &[]),
                    outcome: CycleOutcome::FetchFailed(e.to_string()),
                }
            }
        }
    }

    /// Render already-parsed readings: one tile each, then the alerts.
    pub fn render_readings(&self, registry: &mut TileRegistry, readings: &[Reading]) -> CycleReport {
        let tiles_created = readings
            .iter()
            .filter(|reading| render_sensor_tile(registry, reading))
            .count();

        CycleReport {
            readings: readings.len(),
            tiles_created,
            zones: self.render_alerts(registry, readings),
            outcome: CycleOutcome::Rendered,
        }
    }

    fn render_alerts(&self, registry: &mut TileRegistry, readings: &[Reading]) -> Vec<(String, Zone)> {
        self.alerts
            .iter()
            .map(|alert| {
                let reading = alert.matcher().find(readings);
                let zone = alert.apply(registry, reading);
                debug!(
                    alert = alert.id(),
                    sensor = reading.map(|r| r.name.as_str()),
                    %zone,
                    "alert evaluated"
                );
                (alert.id().to_owned(), zone)
            })
            .collect()
    }

    /// Drive refresh cycles until `shutdown` flips to `true` (or its
    /// sender is dropped).
    ///
    /// The first cycle runs after `timing.startup_delay` whether or not the
    /// page is visible; later ticks are skipped while `gate` is hidden.
    pub async fn run(
        self,
        gate: Arc<VisibilityGate>,
        timing: RefreshTiming,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            source = self.source.name(),
            location = %self.source.location(),
            interval_ms = u64::try_from(timing.interval.as_millis()).unwrap_or(u64::MAX),
            "sensor refresh loop starting"
        );

        tokio::select! {
            () = tokio::time::sleep(timing.startup_delay) => {}
            () = shutdown_requested(&mut shutdown) => {
                info!("sensor refresh loop stopped before first cycle");
                return;
            }
        }
        self.refresh().await;

        let period = timing.interval.max(Duration::from_millis(1));
        let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if gate.is_visible() {
                        self.refresh().await;
                    } else {
                        debug!("page hidden, refresh skipped");
                    }
                }
                () = shutdown_requested(&mut shutdown) => break,
            }
        }

        info!("sensor refresh loop stopped");
    }
}

/// Resolves once the flag is `true` or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use troutwatch_core::reading::parse_line;

    use super::*;
    use crate::board::Dashboard;

    #[test]
    fn tile_ids_are_slugged() {
        assert_eq!(sensor_tile_id("Temp eau truites"), "sensor-temp-eau-truites");
        assert_eq!(sensor_tile_id("  Temp -- Air!! "), "sensor-temp-air");
        assert_eq!(sensor_tile_id("1st probe"), "sensor-s-1st-probe");
        assert_eq!(sensor_tile_id("Été"), "sensor-t");
    }

    #[test]
    fn empty_slug_falls_back_to_timestamp() {
        let id = sensor_tile_id("°°°");
        let suffix = id.strip_prefix(SENSOR_TILE_PREFIX).unwrap_or_default();
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn base36_digits() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_295), "zz");
    }

    #[test]
    fn sensor_tile_value_and_raw_branches() {
        let mut registry = TileRegistry::new();
        assert!(render_sensor_tile(&mut registry, &parse_line("Temp air = 9 C")));
        assert!(render_sensor_tile(&mut registry, &parse_line("Pompe = en marche")));

        let value = registry.get("sensor-temp-air").map(|t| t.body().render());
        assert_eq!(value.as_deref(), Some(r#"<div class="value">9 C</div>"#));
        let raw = registry.get("sensor-pompe").map(|t| t.body().render());
        assert_eq!(raw.as_deref(), Some(r#"<div class="raw">en marche</div>"#));
        assert_eq!(
            registry.get("sensor-temp-air").map(|t| t.icon().to_owned()),
            Some(SENSOR_TILE_ICON.to_owned())
        );
    }

    #[test]
    fn sensor_tile_is_updated_in_place() {
        let mut registry = TileRegistry::new();
        assert!(render_sensor_tile(&mut registry, &parse_line("Temp air = 9 C")));
        assert!(!render_sensor_tile(&mut registry, &parse_line("Temp air = 11 C")));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("sensor-temp-air").map(|t| t.body().text_content()),
            Some("11 C".to_owned())
        );
    }

    #[test]
    fn render_readings_reports_zones() {
        let controller = SensorTileController::new(
            FileSource::new("unused").into(),
            troutwatch_core::config::default_alerts()
                .iter()
                .map(AlertTile::from_config)
                .collect(),
            Dashboard::new().into_shared(),
        );
        let mut registry = TileRegistry::new();
        let readings = parse_readings("Temp eau truites = 21,7 °C\nTemp air = 9 C\n");
        let report = controller.render_readings(&mut registry, &readings);

        assert_eq!(report.readings, 2);
        assert_eq!(report.tiles_created, 2);
        assert_eq!(report.zone("warning-water-temp"), Some(Zone::Normal));
        assert_eq!(report.zone("warning-air-temp"), Some(Zone::TooCold));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn first_matching_reading_wins() {
        let controller = SensorTileController::new(
            FileSource::new("unused").into(),
            troutwatch_core::config::default_alerts()
                .iter()
                .map(AlertTile::from_config)
                .collect(),
            Dashboard::new().into_shared(),
        );
        let mut registry = TileRegistry::new();
        let readings = parse_readings("Temp air = 35 C\nTemp air abri = 15 C\n");
        let report = controller.render_readings(&mut registry, &readings);
        assert_eq!(report.zone("warning-air-temp"), Some(Zone::TooHot));
    }

    #[test]
    fn timing_from_config() {
        let timing = RefreshTiming::from_config(&DashboardConfig::default());
        assert_eq!(timing, RefreshTiming::default());
    }
}
