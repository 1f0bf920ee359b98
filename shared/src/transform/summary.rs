//! Run-level summary: title, timing and legend of an analysis run.

use super::format::timestamp_millis;
use super::metric::{transform_metrics_with_config, TransformError, TransformedMetrics};
use super::status::{status_label, substatus};
use crate::config::TransformConfig;
use crate::models::{
    AnalysisPhase, AnalysisRunInfo, FunctionalStatus, MetricResult, TransformedMetric,
};
use serde::Serialize;

/// Headline information about an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Status text of the whole run.
    pub title: String,
    /// Overall phase of the run.
    pub phase: AnalysisPhase,
    /// Severity flag derived from the run summary counters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substatus: Option<FunctionalStatus>,
    /// Status message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Latest measurement finish time in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

/// One line of the measurement legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    /// Phase the entry counts.
    pub phase: AnalysisPhase,
    /// Text such as "3 Successes".
    pub label: String,
}

/// Summary, legend and transformed metrics of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Run headline.
    pub summary: AnalysisSummary,
    /// Legend for the run counters.
    pub legend: Vec<LegendEntry>,
    /// Transformed metrics keyed by display name.
    pub metrics: TransformedMetrics,
}

/// Returns the run's creation time in milliseconds since the Unix epoch.
#[must_use]
pub fn analysis_start_time(creation_timestamp: Option<&str>) -> Option<i64> {
    timestamp_millis(creation_timestamp)
}

/// Returns the latest measurement finish time across all metric results.
///
/// Measurements without a valid finish time are ignored.
#[must_use]
pub fn analysis_end_time(results: &[MetricResult]) -> Option<i64> {
    results
        .iter()
        .flat_map(|result| &result.measurements)
        .filter_map(|m| timestamp_millis(m.finished_at.as_deref()))
        .max()
}

/// Builds the headline of an analysis run.
///
/// # Examples
///
/// ```
/// use shared::models::{AnalysisPhase, AnalysisRunInfo};
/// use shared::transform::summarize_analysis;
///
/// let run = AnalysisRunInfo {
///     status: Some(AnalysisPhase::Successful),
///     failed: 1,
///     ..AnalysisRunInfo::default()
/// };
///
/// let summary = summarize_analysis(&run);
/// assert_eq!(summary.title, "Analysis passed with measurement failures");
/// assert_eq!(summary.start_time, None);
/// ```
#[must_use]
pub fn summarize_analysis(run: &AnalysisRunInfo) -> AnalysisSummary {
    let phase = run.status.unwrap_or_default();
    let status = run
        .spec_and_status
        .as_ref()
        .and_then(|s| s.status.as_ref());

    let severity = status.and_then(|status| {
        let counts = status.run_summary.unwrap_or_default();
        substatus(status.phase, counts.failed, counts.error, counts.inconclusive)
    });

    AnalysisSummary {
        title: status_label(phase, run.failed, run.error, run.inconclusive),
        phase,
        substatus: severity,
        message: status.and_then(|s| s.message.clone()),
        start_time: analysis_start_time(
            run.object_meta
                .as_ref()
                .and_then(|m| m.creation_timestamp.as_deref()),
        ),
        end_time: status.and_then(|s| analysis_end_time(&s.metric_results)),
    }
}

fn plural(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Builds legend entries for the non-zero counters, in display order.
///
/// # Examples
///
/// ```
/// use shared::transform::legend_entries;
///
/// let labels: Vec<String> = legend_entries(2, 1, 0, 0)
///     .into_iter()
///     .map(|e| e.label)
///     .collect();
/// assert_eq!(labels, vec!["2 Successes", "1 Failure"]);
/// ```
#[must_use]
pub fn legend_entries(
    successful: u32,
    failed: u32,
    error: u32,
    inconclusive: u32,
) -> Vec<LegendEntry> {
    [
        (AnalysisPhase::Successful, plural(successful, "Success", "Successes")),
        (AnalysisPhase::Failed, plural(failed, "Failure", "Failures")),
        (AnalysisPhase::Error, plural(error, "Error", "Errors")),
        (AnalysisPhase::Inconclusive, format!("{inconclusive} Inconclusive")),
    ]
    .into_iter()
    .zip([successful, failed, error, inconclusive])
    .filter(|(_, count)| *count > 0)
    .map(|((phase, label), _)| LegendEntry { phase, label })
    .collect()
}

/// Returns the metrics in listing order.
#[must_use]
pub fn sorted_metrics(metrics: &TransformedMetrics) -> Vec<&TransformedMetric> {
    metrics.values().collect()
}

/// Builds the summary, legend and transformed metrics of a run.
///
/// # Errors
///
/// Returns a [`TransformError`] if a metric cannot be transformed under
/// the given configuration.
pub fn build_report(
    run: &AnalysisRunInfo,
    config: &TransformConfig,
) -> Result<AnalysisReport, TransformError> {
    let metrics = match &run.spec_and_status {
        Some(snapshot) => transform_metrics_with_config(snapshot, config)?,
        None => TransformedMetrics::new(),
    };

    Ok(AnalysisReport {
        summary: summarize_analysis(run),
        legend: legend_entries(run.successful, run.failed, run.error, run.inconclusive),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnalysisSpec, AnalysisSpecAndStatus, AnalysisStatus, Measurement, MetricProvider,
        MetricSpec, ObjectMeta, RunSummary,
    };

    fn finished(at: &str) -> Measurement {
        Measurement::new(AnalysisPhase::Successful, "1").with_times("2024-01-15T10:00:00Z", at)
    }

    #[test]
    fn test_analysis_start_time() {
        assert_eq!(
            analysis_start_time(Some("2024-01-15T10:30:00Z")),
            Some(1_705_314_600_000)
        );
        assert_eq!(analysis_start_time(Some("yesterday")), None);
        assert_eq!(analysis_start_time(None), None);
    }

    #[test]
    fn test_analysis_end_time() {
        let results = vec![
            MetricResult::new("a", AnalysisPhase::Successful)
                .with_measurement(finished("2024-01-15T10:30:00Z"))
                .with_measurement(finished("not a time")),
            MetricResult::new("b", AnalysisPhase::Successful)
                .with_measurement(finished("2024-01-15T10:31:00Z")),
        ];

        assert_eq!(analysis_end_time(&results), Some(1_705_314_660_000));
        assert_eq!(analysis_end_time(&[]), None);
        assert_eq!(
            analysis_end_time(&[MetricResult::new("c", AnalysisPhase::Pending)]),
            None
        );
    }

    #[test]
    fn test_summarize_empty_run() {
        let summary = summarize_analysis(&AnalysisRunInfo::default());

        assert_eq!(summary.title, "Analysis status unknown");
        assert_eq!(summary.phase, AnalysisPhase::Unknown);
        assert_eq!(summary.substatus, None);
        assert_eq!(summary.message, None);
        assert_eq!(summary.end_time, None);
    }

    #[test]
    fn test_summarize_running_run() {
        let run = AnalysisRunInfo {
            object_meta: Some(ObjectMeta {
                name: Some("canary-1".to_string()),
                creation_timestamp: Some("2024-01-15T10:00:00Z".to_string()),
            }),
            status: Some(AnalysisPhase::Running),
            spec_and_status: Some(AnalysisSpecAndStatus {
                spec: None,
                status: Some(AnalysisStatus {
                    phase: AnalysisPhase::Running,
                    message: Some("Metric errored".to_string()),
                    metric_results: vec![MetricResult::new("a", AnalysisPhase::Running)
                        .with_measurement(finished("2024-01-15T10:30:00Z"))],
                    run_summary: Some(RunSummary {
                        error: 1,
                        ..RunSummary::default()
                    }),
                }),
            }),
            ..AnalysisRunInfo::default()
        };

        let summary = summarize_analysis(&run);

        assert_eq!(summary.title, "Analysis in progress");
        assert_eq!(summary.substatus, Some(FunctionalStatus::Warning));
        assert_eq!(summary.message.as_deref(), Some("Metric errored"));
        assert_eq!(summary.start_time, Some(1_705_312_800_000));
        assert_eq!(summary.end_time, Some(1_705_314_600_000));
    }

    #[test]
    fn test_legend_entries() {
        assert!(legend_entries(0, 0, 0, 0).is_empty());

        let entries = legend_entries(1, 2, 1, 3);
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["1 Success", "2 Failures", "1 Error", "3 Inconclusive"]
        );
        assert_eq!(entries[2].phase, AnalysisPhase::Error);
    }

    #[test]
    fn test_build_report_orders_metrics() {
        let run = AnalysisRunInfo {
            status: Some(AnalysisPhase::Successful),
            successful: 2,
            spec_and_status: Some(AnalysisSpecAndStatus {
                spec: Some(AnalysisSpec {
                    metrics: vec![
                        MetricSpec::new("zeta", MetricProvider::prometheus("z")),
                        MetricSpec::new("alpha", MetricProvider::prometheus("a")),
                    ],
                    args: vec![],
                }),
                status: Some(AnalysisStatus {
                    metric_results: vec![
                        MetricResult::new("zeta", AnalysisPhase::Successful),
                        MetricResult::new("alpha", AnalysisPhase::Successful),
                    ],
                    ..AnalysisStatus::default()
                }),
            }),
            ..AnalysisRunInfo::default()
        };

        let report = build_report(&run, &TransformConfig::default()).unwrap();
        let names: Vec<&str> = sorted_metrics(&report.metrics)
            .into_iter()
            .map(|m| m.name.as_str())
            .collect();

        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(report.summary.title, "Analysis passed");
        assert_eq!(report.legend.len(), 1);
    }
}
