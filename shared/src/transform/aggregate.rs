//! Folding a metric's measurements into chart data.

use super::format::timestamp_millis;
use super::measurement::{transform_value, TransformedValue, ValueDecodeError};
use crate::config::{MalformedValuePolicy, TransformConfig};
use crate::models::{Measurement, MeasurementValue, TransformedMeasurement};
use thiserror::Error;

/// A measurement whose value could not be decoded.
#[derive(Debug, Error)]
#[error("Measurement {index}: {source}")]
pub struct MeasurementError {
    /// Position of the measurement within its metric.
    pub index: usize,
    /// The decoding error.
    #[source]
    pub source: ValueDecodeError,
}

/// Transformed measurements together with the chart bounds they span.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSummary {
    /// Whether every measurement can be plotted.
    pub chartable: bool,
    /// Smallest plotted number, never above 0.
    pub min: f64,
    /// Largest plotted number, `None` if nothing numeric was plotted.
    pub max: Option<f64>,
    /// Measurements in input order.
    pub measurements: Vec<TransformedMeasurement>,
}

impl MeasurementSummary {
    fn seed(capacity: usize) -> Self {
        Self {
            chartable: true,
            min: 0.0,
            max: None,
            measurements: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, measurement: &Measurement, value: TransformedValue) {
        self.chartable &= value.can_chart;

        if value.can_chart {
            if let Some(n) = value.chart_number() {
                self.min = self.min.min(n);
                self.max = Some(self.max.unwrap_or(0.0).max(n));
            }
        }

        self.measurements.push(TransformedMeasurement {
            measurement: measurement.clone(),
            chart_value: value.chart_value,
            table_value: value.table_value,
            started_at_ms: timestamp_millis(measurement.started_at.as_deref()),
            finished_at_ms: timestamp_millis(measurement.finished_at.as_deref()),
        });
    }
}

/// Transforms a metric's measurements with the default configuration.
///
/// # Errors
///
/// Returns a [`MeasurementError`] for the first measurement whose value is
/// not valid JSON.
///
/// # Examples
///
/// ```
/// use shared::models::{AnalysisPhase, Measurement};
/// use shared::transform::aggregate_measurements;
///
/// let measurements = vec![
///     Measurement::new(AnalysisPhase::Successful, "[0.5]"),
///     Measurement::new(AnalysisPhase::Failed, "[2.25]"),
/// ];
/// let summary = aggregate_measurements(&["0".to_string()], &measurements).unwrap();
///
/// assert!(summary.chartable);
/// assert_eq!(summary.measurements.len(), 2);
/// ```
pub fn aggregate_measurements(
    condition_keys: &[String],
    measurements: &[Measurement],
) -> Result<MeasurementSummary, MeasurementError> {
    aggregate_measurements_with_config(condition_keys, measurements, &TransformConfig::default())
}

/// Transforms a metric's measurements.
///
/// Every measurement is transformed, even after one turned out to be
/// unchartable. Only single numeric chart values move the bounds.
///
/// # Errors
///
/// With [`MalformedValuePolicy::Propagate`], returns a [`MeasurementError`]
/// for the first measurement whose value is not valid JSON.
pub fn aggregate_measurements_with_config(
    condition_keys: &[String],
    measurements: &[Measurement],
    config: &TransformConfig,
) -> Result<MeasurementSummary, MeasurementError> {
    if measurements.is_empty() {
        return Ok(MeasurementSummary {
            chartable: false,
            min: 0.0,
            max: None,
            measurements: Vec::new(),
        });
    }

    let mut summary = MeasurementSummary::seed(measurements.len());

    for (index, measurement) in measurements.iter().enumerate() {
        let value = match transform_value(condition_keys, measurement.value.as_deref()) {
            Ok(value) => value,
            Err(source) => match config.malformed_values {
                MalformedValuePolicy::Propagate => {
                    return Err(MeasurementError { index, source });
                }
                MalformedValuePolicy::Tabulate => {
                    tracing::warn!(
                        index,
                        value = %source.value,
                        error = %source.source,
                        "Tabulating malformed measurement value"
                    );
                    TransformedValue::table_only(MeasurementValue::text(
                        config.malformed_placeholder.clone(),
                    ))
                }
            },
        };
        summary.push(measurement, value);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisPhase;

    fn measurement(value: &str) -> Measurement {
        Measurement::new(AnalysisPhase::Successful, value)
    }

    #[test]
    fn test_empty_measurements() {
        let summary = aggregate_measurements(&[], &[]).unwrap();
        assert!(!summary.chartable);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, None);
        assert!(summary.measurements.is_empty());
    }

    #[test]
    fn test_min_and_max() {
        let measurements = vec![measurement("3"), measurement("-2.5"), measurement("7.126")];
        let summary = aggregate_measurements(&[], &measurements).unwrap();

        assert!(summary.chartable);
        assert_eq!(summary.min, -2.5);
        assert_eq!(summary.max, Some(7.13));
    }

    #[test]
    fn test_max_never_below_zero() {
        let measurements = vec![measurement("-4"), measurement("-1")];
        let summary = aggregate_measurements(&[], &measurements).unwrap();

        assert_eq!(summary.min, -4.0);
        assert_eq!(summary.max, Some(0.0));
    }

    #[test]
    fn test_keyed_values_do_not_move_bounds() {
        let keys = vec!["0".to_string()];
        let measurements = vec![measurement("[10]"), measurement("[20]")];
        let summary = aggregate_measurements(&keys, &measurements).unwrap();

        assert!(summary.chartable);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, None);
    }

    #[test]
    fn test_unchartable_measurement_narrows_but_all_are_kept() {
        let measurements = vec![
            measurement("1"),
            measurement("\"text\""),
            measurement("5"),
        ];
        let summary = aggregate_measurements(&[], &measurements).unwrap();

        assert!(!summary.chartable);
        assert_eq!(summary.measurements.len(), 3);
        assert_eq!(summary.max, Some(5.0));
        assert_eq!(
            summary.measurements[1].table_value,
            Some(MeasurementValue::text("text"))
        );
    }

    #[test]
    fn test_measurements_keep_original_fields() {
        let measurements = vec![Measurement {
            phase: AnalysisPhase::Error,
            value: None,
            started_at: Some("2024-01-15T10:30:00Z".to_string()),
            finished_at: Some("bogus".to_string()),
            message: Some("timeout".to_string()),
        }];
        let summary = aggregate_measurements(&[], &measurements).unwrap();
        let transformed = &summary.measurements[0];

        assert_eq!(transformed.measurement, measurements[0]);
        assert_eq!(transformed.chart_value, None);
        assert_eq!(transformed.started_at_ms, Some(1_705_314_600_000));
        assert_eq!(transformed.finished_at_ms, None);
        assert!(summary.chartable);
    }

    #[test]
    fn test_malformed_value_propagates() {
        let measurements = vec![measurement("1"), measurement("[1,")];
        let err = aggregate_measurements(&[], &measurements).unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.source.value, "[1,");
    }

    #[test]
    fn test_malformed_value_tabulated() {
        let config = TransformConfig::new(MalformedValuePolicy::Tabulate).with_placeholder("n/a");
        let measurements = vec![measurement("2"), measurement("oops")];
        let summary = aggregate_measurements_with_config(&[], &measurements, &config).unwrap();

        assert!(!summary.chartable);
        assert_eq!(summary.max, Some(2.0));
        assert_eq!(summary.measurements[1].chart_value, None);
        assert_eq!(
            summary.measurements[1].table_value,
            Some(MeasurementValue::text("n/a"))
        );
    }
}
