//! Threshold alert tiles.
//!
//! An [`AlertTile`] watches one reading (picked by its
//! [`SensorMatcher`]) and renders it as a label, a disabled range slider
//! painted with the zone gradient, a colored readout, and a zone caption.
//! A missing reading is shown as [`Zone::NoData`]; the tile is never
//! skipped.

use troutwatch_core::config::AlertConfig;
use troutwatch_core::reading::{Reading, format_value};
use troutwatch_core::zone::{DisplayRange, Gradient, Thresholds, Zone, gradient};
use troutwatch_core::SensorMatcher;

use crate::markup::{Element, Node};
use crate::registry::TileRegistry;

/// Readout shown when there is no value.
pub const NO_VALUE_READOUT: &str = "—";

/// One alert tile definition.
#[derive(Debug, Clone)]
pub struct AlertTile {
    id: String,
    title: String,
    label: String,
    icon: String,
    matcher: SensorMatcher,
    thresholds: Thresholds,
    range: DisplayRange,
}

/// What an alert tile shows for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertState {
    /// Reading value, if a reading matched and was numeric.
    pub value: Option<f64>,
    /// Unit of the matched reading.
    pub unit: String,
    /// Classification of `value`.
    pub zone: Zone,
    /// Slider track.
    pub gradient: Gradient,
    /// Slider position (value clamped into the display range).
    pub position: f64,
}

impl AlertTile {
    /// Build an alert tile from its parts.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        label: impl Into<String>,
        matcher: SensorMatcher,
        thresholds: Thresholds,
        range: DisplayRange,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            label: label.into(),
            icon: "⚠".to_owned(),
            matcher,
            thresholds,
            range,
        }
    }

    /// Build an alert tile from configuration.
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            label: config.label.clone(),
            icon: config.icon.clone(),
            matcher: config.matcher(),
            thresholds: config.thresholds(),
            range: config.range(),
        }
    }

    /// Tile identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Matcher selecting this alert's reading.
    pub const fn matcher(&self) -> &SensorMatcher {
        &self.matcher
    }

    /// Compute the displayed state for a (possibly missing) reading.
    pub fn evaluate(&self, reading: Option<&Reading>) -> AlertState {
        let value = reading.and_then(|r| r.value);
        let unit = reading.map(|r| r.unit.clone()).unwrap_or_default();
        AlertState {
            value,
            unit,
            zone: self.thresholds.classify(value),
            gradient: gradient(
                value,
                self.range.min,
                self.range.max,
                self.thresholds.cold,
                self.thresholds.hot,
            ),
            position: self.range.clamp(value),
        }
    }

    /// Build the tile body for `state`.
    pub fn render(&self, state: &AlertState) -> Vec<Node> {
        let color = state.zone.color();
        let readout = state
            .value
            .map_or_else(|| NO_VALUE_READOUT.to_owned(), |v| format_value(v, &state.unit));

        let slider = Element::new("input")
            .attr("type", "range")
            .attr("min", self.range.min.to_string())
            .attr("max", self.range.max.to_string())
            .attr("value", state.position.to_string())
            .flag("disabled")
            .style(format!(
                "width:100%;height:10px;border-radius:6px;border:0;appearance:none;background:{};",
                state.gradient
            ));

        let row = Element::div()
            .style("display:flex;align-items:center;gap:8px;")
            .child(Element::div().style("flex:1;").child(slider))
            .child(
                Element::div()
                    .class("readout")
                    .style(format!(
                        "min-width:6rem;text-align:right;font-weight:700;color:{color};"
                    ))
                    .text(readout),
            );

        let caption = Element::div().style("margin-top:.4rem;").child(
            Element::span()
                .class("zone")
                .attr("data-zone", state.zone.key())
                .style(format!("color:{color};font-weight:700;"))
                .text(format!("{} — {}", self.label, state.zone.label())),
        );

        vec![
            Element::div().class("muted").text(self.title.as_str()).into(),
            row.into(),
            caption.into(),
        ]
    }

    /// Render the alert for `reading` into the registry.
    ///
    /// The body is rewritten in place when the tile exists, and the tile
    /// is registered otherwise. Returns the zone shown.
    pub fn apply(&self, registry: &mut TileRegistry, reading: Option<&Reading>) -> Zone {
        let state = self.evaluate(reading);
        let body = self.render(&state);

        if let Some(existing) = registry.body_mut(&self.id) {
            existing.replace(body);
        } else {
            let spec = crate::tile::TileSpec::new(self.id.as_str())
                .title(self.title.as_str())
                .icon(self.icon.as_str())
                .size("1x1");
            if let Err(e) = registry.register_with(spec, |api| {
                api.el().replace(body);
                Ok(())
            }) {
                tracing::error!(tile_id = %self.id, error = %e, "alert tile registration failed");
            }
        }

        state.zone
    }
}

#[cfg(test)]
mod tests {
    use troutwatch_core::config::default_alerts;
    use troutwatch_core::reading::parse_line;

    use super::*;

    fn water() -> AlertTile {
        AlertTile::new(
            "warning-water-temp",
            "Water temperature alert (trout)",
            "Water",
            SensorMatcher::water_trout(),
            Thresholds::new(8.0, 22.0),
            DisplayRange::new(-10.0, 35.0),
        )
    }

    #[test]
    fn from_config_matches_stock_water_alert() {
        let stock = default_alerts();
        let tile = stock.first().map(AlertTile::from_config);
        assert_eq!(tile.as_ref().map(AlertTile::id), Some("warning-water-temp"));
        assert!(tile.is_some_and(|t| t.matcher().matches("Temp eau truites")));
    }

    #[test]
    fn evaluates_matched_reading() {
        let reading = parse_line("Temp eau truites = 21,7 °C");
        let state = water().evaluate(Some(&reading));
        assert_eq!(state.zone, Zone::Normal);
        assert_eq!(state.unit, "°C");
        assert_eq!(state.gradient.left, 40);
        assert_eq!(state.gradient.right, 71);
    }

    #[test]
    fn missing_reading_is_no_data() {
        let state = water().evaluate(None);
        assert_eq!(state.zone, Zone::NoData);
        assert!((state.position - -10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_reading_is_no_data() {
        let reading = parse_line("Temp eau truites = N/A");
        assert_eq!(water().evaluate(Some(&reading)).zone, Zone::NoData);
    }

    #[test]
    fn render_contains_slider_readout_and_caption() {
        let tile = water();
        let reading = parse_line("Temp eau truites = 25 °C");
        let html = crate::markup::render_nodes(&tile.render(&tile.evaluate(Some(&reading))));
        assert!(html.contains(r#"<input type="range" min="-10" max="35" value="25" disabled"#));
        assert!(html.contains("linear-gradient(90deg,#007bff 0%"));
        assert!(html.contains(">25 °C</div>"));
        assert!(html.contains(r#"data-zone="too_hot""#));
        assert!(html.contains("Water — Too hot"));
    }

    #[test]
    fn no_data_readout_is_dash() {
        let tile = water();
        let html = crate::markup::render_nodes(&tile.render(&tile.evaluate(None)));
        assert!(html.contains(">—</div>"));
        assert!(html.contains(r#"value="-10""#));
        assert!(html.contains("Water — No data"));
    }

    #[test]
    fn apply_creates_then_updates_in_place() {
        let tile = water();
        let mut registry = TileRegistry::new();

        assert_eq!(tile.apply(&mut registry, None), Zone::NoData);
        assert_eq!(registry.len(), 1);

        let reading = parse_line("Temp eau truites = 5 °C");
        assert_eq!(tile.apply(&mut registry, Some(&reading)), Zone::TooCold);
        assert_eq!(registry.len(), 1);
        let text = registry
            .get("warning-water-temp")
            .map(|t| t.body().text_content())
            .unwrap_or_default();
        assert!(text.contains("Water — Too cold"));
    }
}
