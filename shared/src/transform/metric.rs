//! Assembling presentation records for every metric of an analysis run.
//!
//! For each metric result with a matching spec, the failure and success
//! conditions are parsed, the measurements are folded into chart data and
//! both sides are merged into one [`TransformedMetric`].

use super::aggregate::{aggregate_measurements_with_config, MeasurementError};
use super::condition::parse_condition;
use super::format::round_number;
use super::interpolate::interpolate_str;
use super::status::{status_label, substatus};
use crate::config::TransformConfig;
use crate::models::{
    AnalysisSpecAndStatus, Argument, DatadogProvider, MetricProvider, MetricResult, MetricSpec,
    TransformedMetric, TransformedMetricSpec, TransformedMetricStatus,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Headroom above the highest value or threshold on the chart's value axis.
pub const CHART_HEADROOM: f64 = 1.2;

/// Transformed metrics keyed by display name.
pub type TransformedMetrics = BTreeMap<String, TransformedMetric>;

/// Errors that can occur while transforming an analysis run.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A measurement value of the metric is not valid JSON.
    #[error("Metric '{metric}': {source}")]
    MalformedMeasurement {
        /// Display name of the metric.
        metric: String,
        /// The failing measurement.
        #[source]
        source: MeasurementError,
    },
}

/// Rounds thresholds for drawing. No thresholds means nothing to draw.
#[must_use]
pub fn format_thresholds(thresholds: &[f64]) -> Option<Vec<f64>> {
    if thresholds.is_empty() {
        None
    } else {
        Some(thresholds.iter().copied().map(round_number).collect())
    }
}

/// Computes the upper bound of the chart's value axis.
///
/// Takes the highest of the plotted maximum and all thresholds and adds
/// 20% headroom. Returns `None` when none of them is present.
///
/// # Examples
///
/// ```
/// use shared::transform::chart_max;
///
/// assert_eq!(chart_max(Some(10.0), Some(&[5.0]), None), Some(12.0));
/// assert_eq!(chart_max(Some(1.0), None, Some(&[2.0, 5.0])), Some(6.0));
/// assert_eq!(chart_max(None, None, None), None);
/// ```
#[must_use]
pub fn chart_max(
    value_max: Option<f64>,
    fail_thresholds: Option<&[f64]>,
    success_thresholds: Option<&[f64]>,
) -> Option<f64> {
    let highest = [
        value_max.unwrap_or(f64::NEG_INFINITY),
        highest_threshold(fail_thresholds),
        highest_threshold(success_thresholds),
    ]
    .into_iter()
    .fold(f64::NEG_INFINITY, f64::max);

    highest
        .is_finite()
        .then(|| round_number(highest * CHART_HEADROOM))
}

fn highest_threshold(thresholds: Option<&[f64]>) -> f64 {
    thresholds
        .and_then(|t| t.iter().copied().reduce(f64::max))
        .unwrap_or(f64::NEG_INFINITY)
}

/// Merges failure and success condition keys, keeping first appearances.
#[must_use]
pub fn merge_condition_keys(failure: &[String], success: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(failure.len() + success.len());
    for key in failure.iter().chain(success) {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Builds the display queries of a provider with arguments filled in.
///
/// Returns `None` for providers without query display support or when the
/// provider defines no query.
#[must_use]
pub fn metric_queries(provider: Option<&MetricProvider>, args: &[Argument]) -> Option<Vec<String>> {
    let fill = |template: &str| interpolate_str(template, args);

    let queries = match provider? {
        MetricProvider::Prometheus(p)
        | MetricProvider::Wavefront(p)
        | MetricProvider::NewRelic(p)
        | MetricProvider::Graphite(p)
        | MetricProvider::Influxdb(p)
        | MetricProvider::Skywalking(p) => p.query.as_deref().map(fill).into_iter().collect(),
        MetricProvider::Datadog(d) => datadog_queries(d, args)?,
        MetricProvider::CloudWatch(c) => c
            .metric_data_queries
            .as_ref()?
            .iter()
            .map(serde_json::Value::to_string)
            .collect(),
        MetricProvider::Unsupported { .. } => return None,
    };

    if queries.is_empty() {
        None
    } else {
        Some(queries)
    }
}

fn datadog_queries(provider: &DatadogProvider, args: &[Argument]) -> Option<Vec<String>> {
    let fill = |template: &str| interpolate_str(template, args);
    let version = provider
        .api_version
        .as_deref()
        .unwrap_or("v1")
        .to_lowercase();
    let formula = provider.formula.as_deref().map(fill);

    match version.as_str() {
        "v1" => provider.query.as_deref().map(|q| vec![fill(q)]),
        "v2" => {
            if let Some(query) = provider.query.as_deref() {
                let query = fill(query);
                Some(match formula {
                    Some(formula) => vec![format!("query: {query}, formula: {formula}")],
                    None => vec![query],
                })
            } else if let Some(queries) = &provider.queries {
                let mut filled: Vec<String> = queries.values().map(|q| fill(q)).collect();
                if let Some(formula) = formula {
                    filled.push(format!("formula: {formula}"));
                }
                Some(filled)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Transforms every metric of an analysis run with the default configuration.
///
/// # Errors
///
/// Returns a [`TransformError`] if a measurement value is not valid JSON.
///
/// # Examples
///
/// ```
/// use shared::models::{
///     AnalysisPhase, AnalysisSpec, AnalysisSpecAndStatus, AnalysisStatus, Measurement,
///     MetricProvider, MetricResult, MetricSpec,
/// };
/// use shared::transform::transform_metrics;
///
/// let snapshot = AnalysisSpecAndStatus {
///     spec: Some(AnalysisSpec {
///         metrics: vec![MetricSpec::new("errors", MetricProvider::prometheus("sum(errors)"))
///             .with_failure_condition("result[0] > 10")],
///         args: vec![],
///     }),
///     status: Some(AnalysisStatus {
///         metric_results: vec![MetricResult::new("errors", AnalysisPhase::Successful)
///             .with_measurement(Measurement::new(AnalysisPhase::Successful, "[4]"))],
///         ..AnalysisStatus::default()
///     }),
/// };
///
/// let metrics = transform_metrics(&snapshot).unwrap();
/// let errors = &metrics["errors"];
///
/// assert_eq!(errors.spec.fail_thresholds, Some(vec![10.0]));
/// assert_eq!(errors.status.chart_max, Some(12.0));
/// ```
pub fn transform_metrics(
    snapshot: &AnalysisSpecAndStatus,
) -> Result<TransformedMetrics, TransformError> {
    transform_metrics_with_config(snapshot, &TransformConfig::default())
}

/// Transforms every metric of an analysis run.
///
/// Metric results without a matching spec are left out. A snapshot without
/// spec or status yields no metrics.
///
/// # Errors
///
/// With the default malformed value policy, returns a [`TransformError`]
/// if a measurement value is not valid JSON.
pub fn transform_metrics_with_config(
    snapshot: &AnalysisSpecAndStatus,
    config: &TransformConfig,
) -> Result<TransformedMetrics, TransformError> {
    let (Some(spec), Some(status)) = (&snapshot.spec, &snapshot.status) else {
        return Ok(TransformedMetrics::new());
    };

    let mut metrics = TransformedMetrics::new();

    for (index, result) in status.metric_results.iter().enumerate() {
        let name = result.display_name(index);
        let Some(metric_spec) = spec.metrics.iter().find(|m| m.name == name) else {
            tracing::debug!(metric = %name, "Skipping metric result without a matching spec");
            continue;
        };

        let metric = transform_metric(&name, metric_spec, result, &spec.args, config)?;
        metrics.insert(name, metric);
    }

    Ok(metrics)
}

fn transform_metric(
    name: &str,
    spec: &MetricSpec,
    result: &MetricResult,
    args: &[Argument],
    config: &TransformConfig,
) -> Result<TransformedMetric, TransformError> {
    let provider = spec.provider.as_ref();

    let failure = parse_condition(spec.failure_condition.as_deref(), args, provider);
    let success = parse_condition(spec.success_condition.as_deref(), args, provider);
    let fail_thresholds = format_thresholds(&failure.thresholds);
    let success_thresholds = format_thresholds(&success.thresholds);
    let condition_keys = merge_condition_keys(&failure.condition_keys, &success.condition_keys);

    let summary =
        aggregate_measurements_with_config(&condition_keys, &result.measurements, config)
            .map_err(|source| TransformError::MalformedMeasurement {
                metric: name.to_string(),
                source,
            })?;

    let chart_max = chart_max(
        summary.max,
        fail_thresholds.as_deref(),
        success_thresholds.as_deref(),
    );

    Ok(TransformedMetric {
        name: name.to_string(),
        spec: TransformedMetricSpec {
            spec: spec.clone(),
            queries: metric_queries(provider, args),
            fail_condition_label: failure.label,
            fail_thresholds,
            success_condition_label: success.label,
            success_thresholds,
            condition_keys,
        },
        status: TransformedMetricStatus {
            result: result.clone(),
            status_label: status_label(
                result.phase,
                result.failed,
                result.error,
                result.inconclusive,
            ),
            substatus: substatus(result.phase, result.failed, result.error, result.inconclusive),
            transformed_measurements: summary.measurements,
            chartable: summary.chartable,
            chart_min: summary.min,
            chart_max,
        },
    })
}
