//! Transform configuration.
//!
//! Controls how the metric transforms react to measurement values that are
//! not valid JSON.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Environment variable selecting the [`MalformedValuePolicy`].
pub const MALFORMED_VALUES_ENV: &str = "ROLLVIEW_MALFORMED_VALUES";

/// Environment variable overriding the malformed value placeholder.
pub const MALFORMED_PLACEHOLDER_ENV: &str = "ROLLVIEW_MALFORMED_PLACEHOLDER";

const DEFAULT_PLACEHOLDER: &str = "Unsupported value";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The malformed value policy name is not recognized.
    #[error("Invalid malformed value policy: '{0}'. Expected 'propagate' or 'tabulate'")]
    InvalidPolicy(String),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// What to do with a measurement value that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedValuePolicy {
    /// Stop and return the decoding error to the caller.
    #[default]
    Propagate,
    /// Show a placeholder in the table and keep going.
    Tabulate,
}

impl MalformedValuePolicy {
    /// Returns the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Tabulate => "tabulate",
        }
    }
}

impl std::fmt::Display for MalformedValuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MalformedValuePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "tabulate" => Ok(Self::Tabulate),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Configuration for the metric transforms.
///
/// # Example
///
/// ```
/// use shared::config::{MalformedValuePolicy, TransformConfig};
///
/// let config = TransformConfig::new(MalformedValuePolicy::Tabulate);
/// assert!(config.validate_config().is_ok());
/// assert_eq!(config.malformed_placeholder, "Unsupported value");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TransformConfig {
    /// Policy for measurement values that are not valid JSON.
    #[serde(default)]
    pub malformed_values: MalformedValuePolicy,

    /// Table text shown for tabulated malformed values.
    #[serde(default = "default_placeholder")]
    #[validate(length(min = 1, message = "Malformed value placeholder cannot be empty"))]
    pub malformed_placeholder: String,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl TransformConfig {
    /// Creates a configuration with the given policy and the default placeholder.
    #[must_use]
    pub fn new(malformed_values: MalformedValuePolicy) -> Self {
        Self {
            malformed_values,
            malformed_placeholder: default_placeholder(),
        }
    }

    /// Sets the placeholder for tabulated malformed values.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.malformed_placeholder = placeholder.into();
        self
    }

    /// Creates a configuration from environment variables.
    ///
    /// - `ROLLVIEW_MALFORMED_VALUES`: `propagate` (default) or `tabulate`
    /// - `ROLLVIEW_MALFORMED_PLACEHOLDER`: table text for malformed values
    ///   (default: "Unsupported value")
    ///
    /// # Errors
    ///
    /// Returns an error if the policy name is not recognized or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy name is not recognized or the
    /// resulting configuration is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let malformed_values = lookup(MALFORMED_VALUES_ENV)
            .map(|p| p.parse::<MalformedValuePolicy>())
            .transpose()?
            .unwrap_or_default();

        let malformed_placeholder =
            lookup(MALFORMED_PLACEHOLDER_ENV).unwrap_or_else(default_placeholder);

        let config = Self {
            malformed_values,
            malformed_placeholder,
        };
        config.validate_config()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder is empty.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::new(MalformedValuePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TransformConfig::default();
        assert_eq!(config.malformed_values, MalformedValuePolicy::Propagate);
        assert_eq!(config.malformed_placeholder, "Unsupported value");
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = TransformConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TransformConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = TransformConfig::from_lookup(lookup(&[
            (MALFORMED_VALUES_ENV, "Tabulate"),
            (MALFORMED_PLACEHOLDER_ENV, "n/a"),
        ]))
        .unwrap();

        assert_eq!(config.malformed_values, MalformedValuePolicy::Tabulate);
        assert_eq!(config.malformed_placeholder, "n/a");
    }

    #[test]
    fn test_from_lookup_invalid_policy() {
        let result = TransformConfig::from_lookup(lookup(&[(MALFORMED_VALUES_ENV, "ignore")]));
        assert!(matches!(result, Err(ConfigError::InvalidPolicy(p)) if p == "ignore"));
    }

    #[test]
    fn test_empty_placeholder_rejected() {
        let config = TransformConfig::new(MalformedValuePolicy::Tabulate).with_placeholder("");
        assert!(matches!(
            config.validate_config(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_deserialization() {
        let config: TransformConfig =
            serde_json::from_str(r#"{"malformed_values": "tabulate"}"#).unwrap();
        assert_eq!(config.malformed_values, MalformedValuePolicy::Tabulate);
        assert_eq!(config.malformed_placeholder, "Unsupported value");
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(MalformedValuePolicy::Tabulate.to_string(), "tabulate");
        assert_eq!(
            "propagate".parse::<MalformedValuePolicy>().unwrap(),
            MalformedValuePolicy::Propagate
        );
    }
}
