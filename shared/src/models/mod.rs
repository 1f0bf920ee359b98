//! Data models for Rollview.
//!
//! This module contains the analysis run input structures and the derived
//! structures handed to the presentation layer.

pub mod analysis;
pub mod provider;
pub mod transformed;

pub use analysis::{
    AnalysisPhase, AnalysisRunInfo, AnalysisSpec, AnalysisSpecAndStatus, AnalysisStatus,
    Argument, Measurement, MetricResult, MetricSpec, ObjectMeta, RunSummary,
};
pub use provider::{CloudWatchProvider, DatadogProvider, MetricProvider, ProviderType, QueryProvider};
pub use transformed::{
    FunctionalStatus, KeyedValues, MeasurementValue, MetricView, PassRequirements, Scalar,
    TransformedMeasurement, TransformedMetric, TransformedMetricSpec, TransformedMetricStatus,
};
