//! Transforms from raw analysis runs to presentation records.
//!
//! The pipeline runs bottom-up: argument placeholders are filled in
//! ([`interpolate`]), conditions are mined for labels and thresholds
//! ([`condition`]), measurement values are decoded into chart and table
//! values ([`measurement`]) and folded per metric ([`aggregate`]), then
//! [`metric`] assembles the final records. [`status`] and [`summary`]
//! derive the human-facing labels.
//!
//! Every function here is pure. The same input always yields the same
//! output.

pub mod aggregate;
pub mod condition;
pub mod format;
pub mod interpolate;
pub mod measurement;
pub mod metric;
pub mod status;
pub mod summary;

pub use aggregate::{
    aggregate_measurements, aggregate_measurements_with_config, MeasurementError,
    MeasurementSummary,
};
pub use condition::{accessor_support, parse_condition, AccessorSupport, ConditionDetails};
pub use format::{display_string, round_number, timestamp_millis};
pub use interpolate::{interpolate, interpolate_str};
pub use measurement::{transform_value, TransformedValue, ValueDecodeError};
pub use metric::{
    chart_max, format_thresholds, merge_condition_keys, metric_queries, transform_metrics,
    transform_metrics_with_config, TransformError, TransformedMetrics,
};
pub use status::{functional_status, status_label, substatus};
pub use summary::{
    analysis_end_time, analysis_start_time, build_report, legend_entries, sorted_metrics,
    summarize_analysis, AnalysisReport, AnalysisSummary, LegendEntry,
};
