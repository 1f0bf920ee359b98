//! Derived, presentation-ready metric data.
//!
//! These types are produced by [`crate::transform`] and consumed by whatever
//! renders charts and tables. They embed the original spec and status records
//! (flattened on serialization) next to the computed fields.

use super::analysis::{Measurement, MetricResult, MetricSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single formatted value: a rounded number or display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A number rounded to two decimal places.
    Number(f64),
    /// A non-numeric value in its default string form.
    Text(String),
}

impl Scalar {
    /// Returns the number if this is a numeric scalar.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Values keyed by condition key. `None` means no value for that key.
pub type KeyedValues = BTreeMap<String, Option<Scalar>>;

/// The chart or table value of a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasurementValue {
    /// A single value.
    Scalar(Scalar),
    /// One value per condition key.
    Keyed(KeyedValues),
}

impl MeasurementValue {
    /// Creates a single numeric value.
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Scalar(Scalar::Number(value))
    }

    /// Creates a single text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    /// Returns the number if this is a single numeric value.
    ///
    /// Keyed values never count as a single number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Scalar(s) => s.as_number(),
            Self::Keyed(_) => None,
        }
    }

    /// Returns the keyed values if this is a keyed value.
    #[must_use]
    pub fn as_keyed(&self) -> Option<&KeyedValues> {
        match self {
            Self::Scalar(_) => None,
            Self::Keyed(k) => Some(k),
        }
    }
}

/// A measurement together with its chart and table representations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedMeasurement {
    /// The original measurement.
    #[serde(flatten)]
    pub measurement: Measurement,

    /// Value to plot. `None` is a gap in the chart or a non-chartable value.
    pub chart_value: Option<MeasurementValue>,

    /// Value to show in the table.
    pub table_value: Option<MeasurementValue>,

    /// `startedAt` in milliseconds since the Unix epoch, if valid.
    pub started_at_ms: Option<i64>,

    /// `finishedAt` in milliseconds since the Unix epoch, if valid.
    pub finished_at_ms: Option<i64>,
}

/// Visual status used to theme phases and flag secondary issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalStatus {
    /// Finished successfully.
    Success,
    /// Needs attention.
    Warning,
    /// Failed.
    Error,
    /// Still running.
    InProgress,
    /// Not started or unknown.
    Inactive,
}

impl std::fmt::Display for FunctionalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// A metric spec with its derived condition and query details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedMetricSpec {
    /// The original metric spec.
    #[serde(flatten)]
    pub spec: MetricSpec,

    /// Display queries with arguments filled in.
    pub queries: Option<Vec<String>>,

    /// Interpolated failure condition.
    pub fail_condition_label: Option<String>,

    /// Failure thresholds to draw, `None` when there is nothing to draw.
    pub fail_thresholds: Option<Vec<f64>>,

    /// Interpolated success condition.
    pub success_condition_label: Option<String>,

    /// Success thresholds to draw, `None` when there is nothing to draw.
    pub success_thresholds: Option<Vec<f64>>,

    /// Keys used to pull values out of measurement results.
    pub condition_keys: Vec<String>,
}

/// A metric result with its derived labels and chart data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedMetricStatus {
    /// The original metric result.
    #[serde(flatten)]
    pub result: MetricResult,

    /// Descriptive status text.
    pub status_label: String,

    /// Secondary severity flag, if any.
    pub substatus: Option<FunctionalStatus>,

    /// Measurements with chart and table values.
    pub transformed_measurements: Vec<TransformedMeasurement>,

    /// Whether every measurement can be plotted.
    pub chartable: bool,

    /// Lower bound of the chart's value axis.
    pub chart_min: f64,

    /// Upper bound of the chart's value axis.
    pub chart_max: Option<f64>,
}

/// How a metric is shown when first opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricView {
    /// Line chart.
    Chart,
    /// Table.
    Table,
}

/// Limits a metric must stay within, next to the current counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRequirements {
    /// Allowed consecutive errors.
    pub max_consecutive_errors: i64,
    /// Allowed failures.
    pub max_failures: i64,
    /// Allowed inconclusive measurements.
    pub max_inconclusives: i64,
    /// Current consecutive errors.
    pub consecutive_errors: u32,
    /// Current failures.
    pub failures: u32,
    /// Current inconclusive measurements.
    pub inconclusives: u32,
}

/// A metric's spec and status merged into one presentation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformedMetric {
    /// Display name of the metric.
    pub name: String,
    /// Spec with derived fields.
    pub spec: TransformedMetricSpec,
    /// Status with derived fields.
    pub status: TransformedMetricStatus,
}

impl TransformedMetric {
    /// Returns whether the metric can be drawn as a chart.
    #[must_use]
    pub fn can_chart(&self) -> bool {
        self.status.chartable && self.status.chart_max.is_some()
    }

    /// Returns the view to show first.
    #[must_use]
    pub fn default_view(&self) -> MetricView {
        if self.can_chart() {
            MetricView::Chart
        } else {
            MetricView::Table
        }
    }

    /// Returns the metric's limits and current counts. Missing limits are 0.
    #[must_use]
    pub fn pass_requirements(&self) -> PassRequirements {
        let spec = &self.spec.spec;
        let result = &self.status.result;
        PassRequirements {
            max_consecutive_errors: spec.consecutive_error_limit.unwrap_or(0),
            max_failures: spec.failure_limit.unwrap_or(0),
            max_inconclusives: spec.inconclusive_limit.unwrap_or(0),
            consecutive_errors: result.consecutive_error,
            failures: result.failed,
            inconclusives: result.inconclusive,
        }
    }
}
