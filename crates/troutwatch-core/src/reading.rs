//! Line-oriented sensor dump parsing.
//!
//! The data producer writes one reading per line in the form
//! `Name = value [unit]` or `Name = free text`. This module turns that
//! text into an ordered list of [`Reading`] values. Parsing never fails:
//! a right-hand side without a leading number degrades to a reading
//! whose `value` is `None` and whose `raw` text is kept for display.
//!
//! Numbers accept an optional sign and either `.` or `,` as the decimal
//! separator (`21,7 °C` and `21.7 °C` are the same reading).

use serde::{Deserialize, Serialize};

/// Name given to a reading whose left-hand side is empty.
pub const DEFAULT_SENSOR_NAME: &str = "Capteur";

/// One parsed sensor observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Left-hand side of the line, trimmed.
    pub name: String,
    /// Leading numeric value of the right-hand side, if any.
    ///
    /// Always finite when present.
    pub value: Option<f64>,
    /// Text following the number, trimmed. Empty when there is no value.
    pub unit: String,
    /// The full trimmed right-hand side.
    pub raw: String,
}

impl Reading {
    /// Text shown for this reading: `value unit` when numeric, the raw
    /// right-hand side otherwise.
    pub fn display_text(&self) -> String {
        self.value.map_or_else(
            || self.raw.clone(),
            |value| format_value(value, &self.unit),
        )
    }
}

/// Format a numeric value followed by its unit.
///
/// Integral values print without a fractional part (`9 C`, not `9.0 C`).
pub fn format_value(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value}")
    } else {
        format!("{value} {unit}")
    }
}

/// Parse a whole text dump into readings, one per non-blank line.
///
/// Input order is preserved. Lines are split on `\n`; a trailing `\r`
/// is removed along with the rest of the surrounding whitespace.
pub fn parse_readings(text: &str) -> Vec<Reading> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

/// Parse a single line.
///
/// The first `=` separates the name from the value. A line without `=`
/// is all name and has an empty right-hand side.
pub fn parse_line(line: &str) -> Reading {
    let (left, right) = line.split_once('=').unwrap_or((line, ""));

    let name = match left.trim() {
        "" => DEFAULT_SENSOR_NAME.to_owned(),
        trimmed => trimmed.to_owned(),
    };
    let rhs = right.trim();

    let parsed = split_numeric_prefix(rhs).and_then(|(number, rest)| {
        number
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| (value, rest.trim().to_owned()))
    });

    let (value, unit) = match parsed {
        Some((value, unit)) => (Some(value), unit),
        None => (None, String::new()),
    };

    Reading {
        name,
        value,
        unit,
        raw: rhs.to_owned(),
    }
}

/// Split `text` into a leading decimal token and the remainder.
///
/// The token is an optional `+`/`-`, one or more ASCII digits, and an
/// optional fractional part introduced by `.` or `,` that must itself
/// contain at least one digit. Returns `None` if `text` does not start
/// with such a token.
fn split_numeric_prefix(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let integer_digits = count_digits(bytes, end);
    if integer_digits == 0 {
        return None;
    }
    end = end.checked_add(integer_digits)?;

    if let Some(b'.' | b',') = bytes.get(end) {
        let fraction_start = end.checked_add(1)?;
        let fraction_digits = count_digits(bytes, fraction_start);
        if fraction_digits > 0 {
            end = fraction_start.checked_add(fraction_digits)?;
        }
    }

    // Every byte up to `end` is ASCII, so `end` is a char boundary.
    Some((text.get(..end)?, text.get(end..)?))
}

/// Count consecutive ASCII digits in `bytes` starting at `start`.
fn count_digits(bytes: &[u8], start: usize) -> usize {
    bytes
        .get(start..)
        .map_or(0, |tail| tail.iter().take_while(|b| b.is_ascii_digit()).count())
}
