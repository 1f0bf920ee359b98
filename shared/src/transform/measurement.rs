//! Measurement value classification and transformation.
//!
//! A measurement's value is a JSON document whose shape depends on the
//! provider: a bare number, an array of samples, an object of named
//! results, or something else entirely. The value is decoded once, sorted
//! into a [`ValueShape`], and the shape together with the metric's
//! condition keys decides the chart and table representation.
//!
//! | shape | condition keys | chart value | table value |
//! |---|---|---|---|
//! | absent / `null` | any | gap | empty |
//! | number | any | rounded number | rounded number |
//! | non-empty array | exactly one index `i` | `{i: element}` | `{i: element}` |
//! | non-empty array | exactly one non-index key | none | joined elements |
//! | non-empty array | none or several | first element | joined elements |
//! | object | at least one | `{key: value}` per key | same as chart |
//! | anything else | any | none | default string form |

use super::format::{display_string, format_value, is_chartable, round_number};
use crate::models::{KeyedValues, MeasurementValue, Scalar};
use serde_json::{Map, Value};
use thiserror::Error;

/// A measurement value that is not valid JSON.
#[derive(Debug, Error)]
#[error("Malformed measurement value '{value}': {source}")]
pub struct ValueDecodeError {
    /// The raw value as reported by the provider.
    pub value: String,
    /// The JSON decoding error.
    #[source]
    pub source: serde_json::Error,
}

/// Shape of a decoded measurement value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueShape<'a> {
    /// A finite number.
    Number(f64),
    /// A string.
    Text(&'a str),
    /// `null`.
    Null,
    /// An array, possibly empty.
    Array(&'a [Value]),
    /// An object of named values.
    Object(&'a Map<String, Value>),
    /// Booleans and anything else without a dedicated representation.
    Unsupported(&'a Value),
}

/// Sorts a decoded value into its shape category.
#[must_use]
pub fn classify(value: &Value) -> ValueShape<'_> {
    match value {
        Value::Null => ValueShape::Null,
        Value::Number(n) => match n.as_f64().filter(|n| n.is_finite()) {
            Some(n) => ValueShape::Number(n),
            None => ValueShape::Unsupported(value),
        },
        Value::String(s) => ValueShape::Text(s),
        Value::Array(items) => ValueShape::Array(items),
        Value::Object(map) => ValueShape::Object(map),
        Value::Bool(_) => ValueShape::Unsupported(value),
    }
}

/// Chart and table representation of a single measurement value.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedValue {
    /// Whether the value can be plotted.
    pub can_chart: bool,
    /// Value to plot, if any.
    pub chart_value: Option<MeasurementValue>,
    /// Value to show in the table, if any.
    pub table_value: Option<MeasurementValue>,
}

impl TransformedValue {
    /// A gap in the chart with an empty table cell.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            can_chart: true,
            chart_value: None,
            table_value: None,
        }
    }

    /// A value that is only shown in the table.
    #[must_use]
    pub fn table_only(table_value: MeasurementValue) -> Self {
        Self {
            can_chart: false,
            chart_value: None,
            table_value: Some(table_value),
        }
    }

    fn both(can_chart: bool, value: MeasurementValue) -> Self {
        Self {
            can_chart,
            chart_value: Some(value.clone()),
            table_value: Some(value),
        }
    }

    /// Returns the chart value as a single number, if it is one.
    #[must_use]
    pub fn chart_number(&self) -> Option<f64> {
        self.chart_value.as_ref().and_then(MeasurementValue::as_number)
    }
}

/// Transforms a raw measurement value into chart and table values.
///
/// # Errors
///
/// Returns a [`ValueDecodeError`] if the value is not valid JSON.
///
/// # Examples
///
/// ```
/// use shared::models::MeasurementValue;
/// use shared::transform::transform_value;
///
/// let value = transform_value(&[], Some("[4,6,3,5]")).unwrap();
///
/// assert!(value.can_chart);
/// assert_eq!(value.chart_value, Some(MeasurementValue::number(4.0)));
/// assert_eq!(value.table_value, Some(MeasurementValue::text("4,6,3,5")));
/// ```
pub fn transform_value(
    condition_keys: &[String],
    raw: Option<&str>,
) -> Result<TransformedValue, ValueDecodeError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(TransformedValue::empty());
    };

    let parsed: Value = serde_json::from_str(raw).map_err(|source| ValueDecodeError {
        value: raw.to_string(),
        source,
    })?;

    Ok(match (classify(&parsed), condition_keys) {
        (ValueShape::Null, _) => TransformedValue::empty(),
        (ValueShape::Number(n), _) => {
            TransformedValue::both(true, MeasurementValue::number(round_number(n)))
        }
        (ValueShape::Array(items), [key]) if !items.is_empty() => {
            indexed_element(&parsed, items, key)
        }
        (ValueShape::Array(items), _) if !items.is_empty() => first_element(&parsed, items),
        (ValueShape::Object(map), keys) if !keys.is_empty() => keyed_values(map, keys),
        _ => TransformedValue::table_only(MeasurementValue::text(display_string(&parsed))),
    })
}

/// Picks the array element addressed by a single index condition key.
fn indexed_element(parsed: &Value, items: &[Value], key: &str) -> TransformedValue {
    static NULL: Value = Value::Null;

    let Ok(index) = key.parse::<usize>() else {
        return TransformedValue::table_only(MeasurementValue::text(display_string(parsed)));
    };

    let element = items.get(index).unwrap_or(&NULL);
    let mut keyed = KeyedValues::new();

    match classify(element) {
        ValueShape::Number(_) | ValueShape::Text(_) | ValueShape::Null => {
            keyed.insert(index.to_string(), format_value(element));
            TransformedValue::both(is_chartable(element), MeasurementValue::Keyed(keyed))
        }
        ValueShape::Array(_) | ValueShape::Object(_) | ValueShape::Unsupported(_) => {
            keyed.insert(index.to_string(), Some(Scalar::Text(display_string(element))));
            TransformedValue::table_only(MeasurementValue::Keyed(keyed))
        }
    }
}

/// Charts the first array element and tabulates the whole array.
fn first_element(parsed: &Value, items: &[Value]) -> TransformedValue {
    let first = &items[0];
    let can_chart = is_chartable(first);

    TransformedValue {
        can_chart,
        chart_value: if can_chart {
            format_value(first).map(MeasurementValue::Scalar)
        } else {
            None
        },
        table_value: Some(MeasurementValue::text(display_string(parsed))),
    }
}

/// Pulls one value per condition key out of an object.
fn keyed_values(map: &Map<String, Value>, condition_keys: &[String]) -> TransformedValue {
    let mut keyed = KeyedValues::new();
    let mut all_chartable = true;

    for key in condition_keys {
        let formatted = match map.get(key) {
            Some(value) => {
                all_chartable &= is_chartable(value);
                format_value(value)
            }
            None => None,
        };
        keyed.insert(key.clone(), formatted);
    }

    // all-null results leave nothing to plot
    let has_values = keyed.values().any(Option::is_some);
    TransformedValue::both(all_chartable && has_values, MeasurementValue::Keyed(keyed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    fn keyed(entries: &[(&str, Option<Scalar>)]) -> MeasurementValue {
        MeasurementValue::Keyed(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&json!(1.5)), ValueShape::Number(1.5));
        assert_eq!(classify(&json!("a")), ValueShape::Text("a"));
        assert_eq!(classify(&json!(null)), ValueShape::Null);
        assert!(matches!(classify(&json!([1, 2])), ValueShape::Array(items) if items.len() == 2));
        assert!(matches!(classify(&json!({"a": 1})), ValueShape::Object(_)));
        assert!(matches!(classify(&json!(true)), ValueShape::Unsupported(_)));
    }

    #[test]
    fn test_absent_and_empty_values() {
        assert_eq!(transform_value(&[], None).unwrap(), TransformedValue::empty());
        assert_eq!(transform_value(&[], Some("")).unwrap(), TransformedValue::empty());
    }

    #[test]
    fn test_null_value() {
        assert_eq!(transform_value(&keys(&["0"]), Some("null")).unwrap(), TransformedValue::empty());
    }

    #[test]
    fn test_number() {
        let value = transform_value(&[], Some("4.05")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(MeasurementValue::number(4.05)));
        assert_eq!(value.table_value, Some(MeasurementValue::number(4.05)));

        let value = transform_value(&keys(&["0"]), Some("3.14159")).unwrap();
        assert_eq!(value.chart_number(), Some(3.14));
    }

    #[test]
    fn test_array_without_keys_charts_first_element() {
        let value = transform_value(&[], Some("[4,6,3,5]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(MeasurementValue::number(4.0)));
        assert_eq!(value.table_value, Some(MeasurementValue::text("4,6,3,5")));
    }

    #[test]
    fn test_array_with_unchartable_first_element() {
        let value = transform_value(&[], Some("[\"up\",2]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(MeasurementValue::text("up,2")));

        let value = transform_value(&[], Some("[{\"a\":1},2]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.table_value, Some(MeasurementValue::text("[object Object],2")));
    }

    #[test]
    fn test_array_with_null_first_element() {
        let value = transform_value(&[], Some("[null,3]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(MeasurementValue::text(",3")));
    }

    #[test]
    fn test_array_with_several_keys_charts_first_element() {
        let value = transform_value(&keys(&["0", "1"]), Some("[1.234,2]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(MeasurementValue::number(1.23)));
        assert_eq!(value.table_value, Some(MeasurementValue::text("1.234,2")));
    }

    #[test]
    fn test_array_with_index_key() {
        let value = transform_value(&keys(&["0"]), Some("[null]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(keyed(&[("0", None)])));
        assert_eq!(value.table_value, Some(keyed(&[("0", None)])));

        let value = transform_value(&keys(&["1"]), Some("[1, 2.346]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(keyed(&[("1", Some(Scalar::Number(2.35)))])));
    }

    #[test]
    fn test_array_with_index_key_string_element() {
        let value = transform_value(&keys(&["0"]), Some("[\"n/a\"]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, Some(keyed(&[("0", Some(Scalar::from("n/a")))])));
        assert_eq!(value.table_value, Some(keyed(&[("0", Some(Scalar::from("n/a")))])));
    }

    #[test]
    fn test_array_with_index_key_out_of_range() {
        let value = transform_value(&keys(&["3"]), Some("[1]")).unwrap();
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(keyed(&[("3", None)])));
    }

    #[test]
    fn test_array_with_index_key_unsupported_element() {
        let value = transform_value(&keys(&["0"]), Some("[[1,2],3]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(keyed(&[("0", Some(Scalar::from("1,2")))])));

        let value = transform_value(&keys(&["0"]), Some("[{\"a\":1}]")).unwrap();
        assert_eq!(
            value.table_value,
            Some(keyed(&[("0", Some(Scalar::from("[object Object]")))]))
        );
    }

    #[test]
    fn test_array_with_non_index_key() {
        let value = transform_value(&keys(&["p99"]), Some("[1,2]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(MeasurementValue::text("1,2")));

        let value = transform_value(&keys(&["-1"]), Some("[1,2]")).unwrap();
        assert!(!value.can_chart);
    }

    #[test]
    fn test_object_with_keys() {
        let value = transform_value(
            &keys(&["successRate", "count"]),
            Some(r#"{"successRate": 0.9876, "count": 120, "other": "x"}"#),
        )
        .unwrap();

        let expected = keyed(&[
            ("successRate", Some(Scalar::Number(0.99))),
            ("count", Some(Scalar::Number(120.0))),
        ]);
        assert!(value.can_chart);
        assert_eq!(value.chart_value, Some(expected.clone()));
        assert_eq!(value.table_value, Some(expected));
    }

    #[test]
    fn test_object_with_missing_key() {
        let value = transform_value(&keys(&["a", "b"]), Some(r#"{"a": 1}"#)).unwrap();
        assert!(value.can_chart);
        assert_eq!(
            value.chart_value,
            Some(keyed(&[("a", Some(Scalar::Number(1.0))), ("b", None)]))
        );
    }

    #[test]
    fn test_object_with_all_null_values_is_not_chartable() {
        let value = transform_value(&keys(&["a", "b"]), Some(r#"{"a": null}"#)).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, Some(keyed(&[("a", None), ("b", None)])));
    }

    #[test]
    fn test_object_with_unchartable_value() {
        let value = transform_value(&keys(&["a"]), Some(r#"{"a": {"nested": true}}"#)).unwrap();
        assert!(!value.can_chart);
        assert_eq!(
            value.table_value,
            Some(keyed(&[("a", Some(Scalar::from("[object Object]")))]))
        );
    }

    #[test]
    fn test_numbers_past_f64_range_are_tabulated() {
        let value = transform_value(&[], Some("1e400")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(MeasurementValue::text("Infinity")));

        let value = transform_value(&[], Some("[1e400]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.chart_value, None);
        assert_eq!(value.table_value, Some(MeasurementValue::text("Infinity")));

        let value = transform_value(&keys(&["0"]), Some("[-1e400, 1]")).unwrap();
        assert!(!value.can_chart);
        assert_eq!(value.table_value, Some(keyed(&[("0", Some(Scalar::from("-Infinity")))])));
    }

    #[test]
    fn test_object_without_keys() {
        let value = transform_value(&[], Some(r#"{"a": 1}"#)).unwrap();
        assert_eq!(
            value,
            TransformedValue::table_only(MeasurementValue::text("[object Object]"))
        );
    }

    #[test]
    fn test_other_shapes_are_tabulated() {
        assert_eq!(
            transform_value(&[], Some("\"ok\"")).unwrap(),
            TransformedValue::table_only(MeasurementValue::text("ok"))
        );
        assert_eq!(
            transform_value(&[], Some("true")).unwrap(),
            TransformedValue::table_only(MeasurementValue::text("true"))
        );
        assert_eq!(
            transform_value(&keys(&["0"]), Some("[]")).unwrap(),
            TransformedValue::table_only(MeasurementValue::text(""))
        );
    }

    #[test]
    fn test_malformed_value() {
        let err = transform_value(&[], Some("{not json")).unwrap_err();
        assert_eq!(err.value, "{not json");
        assert!(err.to_string().starts_with("Malformed measurement value '{not json'"));

        assert!(transform_value(&[], Some("NaN")).is_err());
    }
}
