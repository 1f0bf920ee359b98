//! Rollview Shared Library
//!
//! This crate turns the raw spec and status of a progressive-delivery
//! analysis run into presentation records: status labels, chart bounds,
//! thresholds drawn from conditions and chart/table values per measurement.
//!
//! # Modules
//!
//! - [`models`] - Analysis run input and transformed output types
//! - [`transform`] - The transform pipeline
//! - [`config`] - Transform configuration
//!
//! # Example
//!
//! ```
//! use shared::models::{
//!     AnalysisPhase, AnalysisSpec, AnalysisSpecAndStatus, AnalysisStatus, Argument,
//!     Measurement, MetricProvider, MetricResult, MetricSpec, MetricView,
//! };
//! use shared::transform::transform_metrics;
//!
//! let snapshot = AnalysisSpecAndStatus {
//!     spec: Some(AnalysisSpec {
//!         metrics: vec![MetricSpec::new(
//!             "latency",
//!             MetricProvider::prometheus("p99{service=\"{{args.service}}\"}"),
//!         )
//!         .with_failure_condition("result[0] > 500")],
//!         args: vec![Argument::new("service", "checkout")],
//!     }),
//!     status: Some(AnalysisStatus {
//!         metric_results: vec![MetricResult::new("latency", AnalysisPhase::Running)
//!             .with_measurement(Measurement::new(AnalysisPhase::Successful, "320"))],
//!         ..AnalysisStatus::default()
//!     }),
//! };
//!
//! let metrics = transform_metrics(&snapshot).unwrap();
//! let latency = &metrics["latency"];
//!
//! assert_eq!(latency.spec.queries, Some(vec!["p99{service=\"checkout\"}".to_string()]));
//! assert_eq!(latency.status.chart_max, Some(600.0));
//! assert_eq!(latency.default_view(), MetricView::Chart);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod models;
pub mod transform;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
