//! Formatting helpers shared by the transforms.
//!
//! Decoded measurement values are rendered the way a JavaScript front end
//! would stringify them, so table text matches what users see elsewhere:
//! arrays join their elements with commas, `null` elements inside arrays
//! become empty strings and objects render as `[object Object]`. Numbers
//! use exponent notation outside `1e-6..1e21`, and numbers too large for an
//! `f64` print as `Infinity`.

use crate::models::Scalar;
use chrono::DateTime;
use serde_json::{Number, Value};

/// Rounds a number to two decimal places.
///
/// Halves round away from zero.
///
/// # Examples
///
/// ```
/// use shared::transform::round_number;
///
/// assert_eq!(round_number(4.056), 4.06);
/// assert_eq!(round_number(-1.234), -1.23);
/// ```
#[must_use]
pub fn round_number(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns the value as a finite number, if it is one.
#[must_use]
pub fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

/// Returns whether a decoded value can be a point on a line chart.
///
/// Finite numbers and `null` (a gap) are chartable; everything else is not.
#[must_use]
pub fn is_chartable(value: &Value) -> bool {
    value.is_null() || finite_number(value).is_some()
}

/// Formats a decoded value for display.
///
/// Numbers are rounded, `null` stays absent and anything else is rendered
/// with [`display_string`].
#[must_use]
pub fn format_value(value: &Value) -> Option<Scalar> {
    if value.is_null() {
        return None;
    }
    Some(match finite_number(value) {
        Some(n) => Scalar::Number(round_number(n)),
        None => Scalar::Text(display_string(value)),
    })
}

/// Renders a decoded value in its default string form.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use shared::transform::display_string;
///
/// assert_eq!(display_string(&json!([4, null, "a", [1, 2]])), "4,,a,1,2");
/// assert_eq!(display_string(&json!({"a": 1})), "[object Object]");
/// ```
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(decoded_f64(n)),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                if item.is_null() {
                    String::new()
                } else {
                    display_string(item)
                }
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numbers past the `f64` range decode to infinity.
fn decoded_f64(n: &Number) -> f64 {
    n.as_f64()
        .or_else(|| n.to_string().parse().ok())
        .unwrap_or(f64::NAN)
}

fn number_string(n: f64) -> String {
    let magnitude = n.abs();
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() && n.is_sign_positive() {
        "Infinity".to_string()
    } else if n.is_infinite() {
        "-Infinity".to_string()
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else if magnitude >= 1e21 || magnitude < 1e-6 {
        exponent_string(n)
    } else {
        n.to_string()
    }
}

/// Exponent notation with an explicit sign on positive exponents (`1e+21`).
fn exponent_string(n: f64) -> String {
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

/// Parses an RFC 3339 timestamp into milliseconds since the Unix epoch.
///
/// Returns `None` for absent or invalid timestamps.
#[must_use]
pub fn timestamp_millis(timestamp: Option<&str>) -> Option<i64> {
    timestamp
        .and_then(|t| DateTime::parse_from_rfc3339(t.trim()).ok())
        .map(|dt| dt.timestamp_millis())
}
