//! Threshold zone classification.
//!
//! An alert tile compares one reading against a cold and a hot threshold
//! and shows the result as a [`Zone`]. Boundaries are inclusive: a value
//! equal to a threshold belongs to the extreme zone, not to
//! [`Zone::Normal`].
//!
//! The same thresholds drive the slider track drawn under the value: a
//! three-stop [`Gradient`] (blue, green, red) whose stop positions are
//! the thresholds mapped into `[0, 100]` over the tile's display range.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Track color for the cold part of the gradient.
pub const COLD_STOP_COLOR: &str = "#007bff";
/// Track color for the normal part of the gradient.
pub const NORMAL_STOP_COLOR: &str = "#28a745";
/// Track color for the hot part of the gradient.
pub const HOT_STOP_COLOR: &str = "#ff3b3b";

/// Qualitative classification of a value against two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// At or below the cold threshold.
    TooCold,
    /// Strictly between the thresholds.
    Normal,
    /// At or above the hot threshold.
    TooHot,
    /// No usable value.
    NoData,
}

impl Zone {
    /// Machine-readable key, matching the serialized form.
    pub const fn key(self) -> &'static str {
        match self {
            Self::TooCold => "too_cold",
            Self::Normal => "normal",
            Self::TooHot => "too_hot",
            Self::NoData => "no_data",
        }
    }

    /// Caption shown on the alert tile.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TooCold => "Too cold",
            Self::Normal => "Normal",
            Self::TooHot => "Too hot",
            Self::NoData => "No data",
        }
    }

    /// CSS color used for the readout and caption.
    pub const fn color(self) -> &'static str {
        match self {
            Self::TooCold => "#007bff",
            Self::Normal => "#28a745",
            Self::TooHot => "#c00",
            Self::NoData => "#666",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cold/hot threshold pair for one alert tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Values at or below this are [`Zone::TooCold`].
    pub cold: f64,
    /// Values at or above this are [`Zone::TooHot`].
    pub hot: f64,
}

impl Thresholds {
    /// Create a threshold pair.
    pub const fn new(cold: f64, hot: f64) -> Self {
        Self { cold, hot }
    }

    /// Classify `value` against this pair. See [`classify`].
    pub fn classify(&self, value: Option<f64>) -> Zone {
        classify(value, self.cold, self.hot)
    }
}

/// Visual range of an alert tile's slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    /// Left end of the slider.
    pub min: f64,
    /// Right end of the slider.
    pub max: f64,
}

impl DisplayRange {
    /// Create a display range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range. Absent or NaN values collapse to
    /// `min`.
    pub const fn clamp(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if !v.is_nan() => v.max(self.min).min(self.max),
            _ => self.min,
        }
    }

    /// Position of `value` in percent of the range, clamped and rounded.
    ///
    /// A range narrower than one unit is treated as one unit wide.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self, value: f64) -> u8 {
        let clamped = value.max(self.min).min(self.max);
        let span = (self.max - self.min).max(1.0);
        // Within [0, 100], so the cast is lossless.
        (100.0 * (clamped - self.min) / span).round().clamp(0.0, 100.0) as u8
    }
}

/// Classify a value against a cold and hot threshold.
///
/// Total over all inputs: `None` and NaN are [`Zone::NoData`]; the cold
/// comparison is checked first, so an inverted pair still yields a
/// defined zone.
pub fn classify(value: Option<f64>, cold: f64, hot: f64) -> Zone {
    match value {
        None => Zone::NoData,
        Some(v) if v.is_nan() => Zone::NoData,
        Some(v) if v <= cold => Zone::TooCold,
        Some(v) if v >= hot => Zone::TooHot,
        Some(_) => Zone::Normal,
    }
}

/// Three-stop slider track descriptor.
///
/// `left` is always the lower stop position, whichever threshold produced
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    /// Where the cold color ends and the normal color starts (percent).
    pub left: u8,
    /// Where the normal color ends and the hot color starts (percent).
    pub right: u8,
    /// Position of the clamped value (percent).
    pub marker: u8,
}

impl Gradient {
    /// Render as a CSS `linear-gradient`.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { left, right, .. } = self;
        write!(
            f,
            "linear-gradient(90deg,{COLD_STOP_COLOR} 0%,{COLD_STOP_COLOR} {left}%,\
             {NORMAL_STOP_COLOR} {left}%,{NORMAL_STOP_COLOR} {right}%,\
             {HOT_STOP_COLOR} {right}%,{HOT_STOP_COLOR} 100%)"
        )
    }
}

/// Build the slider gradient for `value` over `[min, max]`.
///
/// Both thresholds are clamped into the range before being mapped to
/// percentages, and the two stops are ordered so the lower position comes
/// first. Swapping `cold` and `hot` yields the same stops.
pub fn gradient(value: Option<f64>, min: f64, max: f64, cold: f64, hot: f64) -> Gradient {
    let range = DisplayRange::new(min, max);
    let cold_pct = range.percent(cold);
    let hot_pct = range.percent(hot);

    Gradient {
        left: cold_pct.min(hot_pct),
        right: cold_pct.max(hot_pct),
        marker: range.percent(range.clamp(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_serialized_form() {
        for zone in [Zone::TooCold, Zone::Normal, Zone::TooHot, Zone::NoData] {
            let json = serde_json::to_value(zone).ok();
            assert_eq!(json.as_ref().and_then(serde_json::Value::as_str), Some(zone.key()));
        }
    }

    #[test]
    fn classify_zones() {
        assert_eq!(classify(Some(21.7), 8.0, 22.0), Zone::Normal);
        assert_eq!(classify(Some(9.0), 10.0, 30.0), Zone::TooCold);
        assert_eq!(classify(Some(35.0), 10.0, 30.0), Zone::TooHot);
        assert_eq!(classify(None, 10.0, 30.0), Zone::NoData);
        assert_eq!(classify(Some(f64::NAN), 10.0, 30.0), Zone::NoData);
    }

    #[test]
    fn boundaries_belong_to_extreme_zones() {
        assert_eq!(classify(Some(8.0), 8.0, 22.0), Zone::TooCold);
        assert_eq!(classify(Some(22.0), 8.0, 22.0), Zone::TooHot);
        assert_eq!(classify(Some(8.000_001), 8.0, 22.0), Zone::Normal);
        assert_eq!(classify(Some(21.999_999), 8.0, 22.0), Zone::Normal);
    }

    #[test]
    fn classify_is_total_over_extremes() {
        assert_eq!(classify(Some(f64::NEG_INFINITY), 0.0, 1.0), Zone::TooCold);
        assert_eq!(classify(Some(f64::INFINITY), 0.0, 1.0), Zone::TooHot);
    }

    #[test]
    fn thresholds_method_matches_free_function() {
        let t = Thresholds::new(10.0, 30.0);
        for v in [-5.0, 10.0, 15.0, 30.0, 40.0] {
            assert_eq!(t.classify(Some(v)), classify(Some(v), 10.0, 30.0));
        }
    }

    #[test]
    fn labels_and_colors() {
        assert_eq!(Zone::TooCold.label(), "Too cold");
        assert_eq!(Zone::NoData.to_string(), "No data");
        assert_eq!(Zone::TooHot.color(), "#c00");
    }

    #[test]
    fn gradient_stop_positions() {
        // (8 - -10) / 45 = 40%, (22 - -10) / 45 = 71.1% -> 71%
        let g = gradient(Some(21.7), -10.0, 35.0, 8.0, 22.0);
        assert_eq!(g.left, 40);
        assert_eq!(g.right, 71);
        assert_eq!(g.marker, 70);
    }

    #[test]
    fn gradient_order_invariant_under_swap() {
        let a = gradient(Some(5.0), -10.0, 35.0, 10.0, 30.0);
        let b = gradient(Some(5.0), -10.0, 35.0, 30.0, 10.0);
        assert_eq!(a, b);
        assert!(a.left <= a.right);
    }

    #[test]
    fn gradient_clamps_thresholds_and_value() {
        let g = gradient(Some(100.0), 0.0, 10.0, -5.0, 50.0);
        assert_eq!(g.left, 0);
        assert_eq!(g.right, 100);
        assert_eq!(g.marker, 100);
    }

    #[test]
    fn missing_value_collapses_to_min() {
        let g = gradient(None, -10.0, 35.0, 8.0, 22.0);
        assert_eq!(g.marker, 0);
        let range = DisplayRange::new(-10.0, 35.0);
        assert!((range.clamp(None) - -10.0).abs() < f64::EPSILON);
        assert!((range.clamp(Some(f64::NAN)) - -10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degenerate_range_does_not_divide_by_zero() {
        let g = gradient(Some(3.0), 3.0, 3.0, 3.0, 3.0);
        assert_eq!(g.left, 0);
        assert_eq!(g.right, 0);
    }

    #[test]
    fn css_output() {
        let g = gradient(None, -10.0, 35.0, 10.0, 30.0);
        assert_eq!(
            g.to_css(),
            "linear-gradient(90deg,#007bff 0%,#007bff 44%,#28a745 44%,#28a745 89%,#ff3b3b 89%,#ff3b3b 100%)"
        );
    }
}
