//! Configuration module for Rollview.
//!
//! This module contains the settings that control the metric transforms.

pub mod transform;

pub use transform::{ConfigError, MalformedValuePolicy, TransformConfig};
