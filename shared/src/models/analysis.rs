//! Analysis run data model.
//!
//! Mirrors the parts of a rollout analysis run (spec and status) that the
//! metric transforms read. Every field the upstream controller may omit is
//! optional or defaulted so that partially populated runs still deserialize.

use super::provider::MetricProvider;
use serde::{Deserialize, Serialize};

/// A named argument passed to an analysis run.
///
/// Argument names are not guaranteed to be unique; lookups take the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// The argument name referenced by `{{ args.<name> }}` placeholders.
    pub name: String,
    /// The resolved argument value, if the controller resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Argument {
    /// Creates a new argument with a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Phase of an analysis run, a metric or a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalysisPhase {
    /// Not started yet.
    Pending,
    /// Measurements are being taken.
    Running,
    /// Finished and passed.
    Successful,
    /// Finished and failed.
    Failed,
    /// Finished with errors.
    Error,
    /// Finished without a clear verdict.
    Inconclusive,
    /// No phase was reported.
    #[default]
    Unknown,
    /// A phase name this crate does not know about.
    #[serde(other)]
    Unrecognized,
}

impl AnalysisPhase {
    /// Returns the phase name as reported by the controller.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::Error => "Error",
            Self::Inconclusive => "Inconclusive",
            Self::Unknown => "Unknown",
            Self::Unrecognized => "Unrecognized",
        }
    }
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Definition of a single metric within an analysis.
///
/// # Example
///
/// ```
/// use shared::models::{MetricProvider, MetricSpec};
///
/// let spec = MetricSpec::new("error-rate", MetricProvider::prometheus("sum(errors)"))
///     .with_failure_condition("result[0] > 0.05");
///
/// assert_eq!(spec.failure_condition.as_deref(), Some("result[0] > 0.05"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    /// The metric name, used to join the spec with its results.
    pub name: String,

    /// The metric provider and its query configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<MetricProvider>,

    /// Expression that marks a measurement as successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<String>,

    /// Expression that marks a measurement as failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_condition: Option<String>,

    /// Number of consecutive errors tolerated before the metric errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_error_limit: Option<i64>,

    /// Number of failed measurements tolerated before the metric fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_limit: Option<i64>,

    /// Number of inconclusive measurements tolerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inconclusive_limit: Option<i64>,
}

impl MetricSpec {
    /// Creates a new metric spec without conditions or limits.
    #[must_use]
    pub fn new(name: impl Into<String>, provider: MetricProvider) -> Self {
        Self {
            name: name.into(),
            provider: Some(provider),
            success_condition: None,
            failure_condition: None,
            consecutive_error_limit: None,
            failure_limit: None,
            inconclusive_limit: None,
        }
    }

    /// Sets the success condition.
    #[must_use]
    pub fn with_success_condition(mut self, condition: impl Into<String>) -> Self {
        self.success_condition = Some(condition.into());
        self
    }

    /// Sets the failure condition.
    #[must_use]
    pub fn with_failure_condition(mut self, condition: impl Into<String>) -> Self {
        self.failure_condition = Some(condition.into());
        self
    }

    /// Sets the failure limit.
    #[must_use]
    pub fn with_failure_limit(mut self, limit: i64) -> Self {
        self.failure_limit = Some(limit);
        self
    }
}

/// A single measurement taken for a metric.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Outcome of this measurement.
    #[serde(default)]
    pub phase: AnalysisPhase,

    /// JSON-encoded provider result. Its shape depends on the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// When the measurement started (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    /// When the measurement finished (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,

    /// Error or status message reported with the measurement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Measurement {
    /// Creates a measurement with the given phase and raw value.
    #[must_use]
    pub fn new(phase: AnalysisPhase, value: impl Into<String>) -> Self {
        Self {
            phase,
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the start and finish timestamps.
    #[must_use]
    pub fn with_times(mut self, started_at: impl Into<String>, finished_at: impl Into<String>) -> Self {
        self.started_at = Some(started_at.into());
        self.finished_at = Some(finished_at.into());
        self
    }
}

/// The status side of a metric: its phase, counters and measurements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    /// Name of the metric these results belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Phase of the metric.
    #[serde(default)]
    pub phase: AnalysisPhase,

    /// Number of measurements taken.
    #[serde(default)]
    pub count: u32,

    /// Number of failed measurements.
    #[serde(default)]
    pub failed: u32,

    /// Number of errored measurements.
    #[serde(default)]
    pub error: u32,

    /// Number of inconclusive measurements.
    #[serde(default)]
    pub inconclusive: u32,

    /// Number of successful measurements.
    #[serde(default)]
    pub successful: u32,

    /// Number of errors in a row at the end of the run.
    #[serde(default)]
    pub consecutive_error: u32,

    /// Message reported for the metric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Measurements in the order they were taken.
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

impl MetricResult {
    /// Creates an empty result for the named metric.
    #[must_use]
    pub fn new(name: impl Into<String>, phase: AnalysisPhase) -> Self {
        Self {
            name: Some(name.into()),
            phase,
            ..Self::default()
        }
    }

    /// Appends a measurement.
    #[must_use]
    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurements.push(measurement);
        self
    }

    /// Sets the failed/error/inconclusive counters.
    #[must_use]
    pub fn with_counts(mut self, failed: u32, error: u32, inconclusive: u32) -> Self {
        self.failed = failed;
        self.error = error;
        self.inconclusive = inconclusive;
        self
    }

    /// Returns the name to display for this result.
    ///
    /// Falls back to `Unknown metric <index>` when the controller did not
    /// report a name.
    #[must_use]
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Unknown metric {index}"))
    }
}

/// Aggregated counters for a whole analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Total number of metrics.
    #[serde(default)]
    pub count: u32,
    /// Number of successful metrics.
    #[serde(default)]
    pub successful: u32,
    /// Number of failed metrics.
    #[serde(default)]
    pub failed: u32,
    /// Number of inconclusive metrics.
    #[serde(default)]
    pub inconclusive: u32,
    /// Number of errored metrics.
    #[serde(default)]
    pub error: u32,
}

/// Spec section of an analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSpec {
    /// Metric definitions.
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
    /// Arguments shared by all metrics.
    #[serde(default)]
    pub args: Vec<Argument>,
}

/// Status section of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatus {
    /// Phase of the whole run.
    #[serde(default)]
    pub phase: AnalysisPhase,
    /// Message describing the run outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-metric results.
    #[serde(default)]
    pub metric_results: Vec<MetricResult>,
    /// Run-level counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_summary: Option<RunSummary>,
}

/// Spec and status of an analysis run, as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSpecAndStatus {
    /// The analysis spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<AnalysisSpec>,
    /// The analysis status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnalysisStatus>,
}

/// Object metadata of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Name of the analysis run object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// When the analysis run object was created (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
}

/// An analysis run together with its top-level status counters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRunInfo {
    /// Object metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_meta: Option<ObjectMeta>,
    /// Overall phase of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnalysisPhase>,
    /// Number of successful metrics.
    #[serde(default)]
    pub successful: u32,
    /// Number of failed metrics.
    #[serde(default)]
    pub failed: u32,
    /// Number of inconclusive metrics.
    #[serde(default)]
    pub inconclusive: u32,
    /// Number of errored metrics.
    #[serde(default)]
    pub error: u32,
    /// Spec and status of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_and_status: Option<AnalysisSpecAndStatus>,
}
