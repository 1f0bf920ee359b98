//! Metric provider model.
//!
//! On the wire a provider is an object with a single key naming the provider
//! type (`{"prometheus": {...}}`). It is decoded once into [`MetricProvider`],
//! an explicit tagged union, so the transforms can match on the variant
//! instead of probing object keys.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The provider type a metric queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    /// Prometheus.
    Prometheus,
    /// Datadog.
    Datadog,
    /// Wavefront.
    Wavefront,
    /// New Relic.
    NewRelic,
    /// AWS CloudWatch.
    CloudWatch,
    /// Graphite.
    Graphite,
    /// InfluxDB.
    Influxdb,
    /// Apache SkyWalking.
    Skywalking,
    /// Any other provider (job, web, kayenta, plugins, ...).
    Unsupported,
}

impl ProviderType {
    /// Looks up a provider type from its wire key.
    ///
    /// Returns `None` for keys that do not name a known provider.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "prometheus" => Some(Self::Prometheus),
            "datadog" => Some(Self::Datadog),
            "wavefront" => Some(Self::Wavefront),
            "newRelic" => Some(Self::NewRelic),
            "cloudWatch" => Some(Self::CloudWatch),
            "graphite" => Some(Self::Graphite),
            "influxdb" => Some(Self::Influxdb),
            "skywalking" => Some(Self::Skywalking),
            _ => None,
        }
    }

    /// Returns the wire key of this provider type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prometheus => "prometheus",
            Self::Datadog => "datadog",
            Self::Wavefront => "wavefront",
            Self::NewRelic => "newRelic",
            Self::CloudWatch => "cloudWatch",
            Self::Graphite => "graphite",
            Self::Influxdb => "influxdb",
            Self::Skywalking => "skywalking",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration of a provider driven by a single query string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryProvider {
    /// The query template, possibly containing `{{ args.<name> }}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Remaining provider settings (address, profile, timeout, ...), kept as-is.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl QueryProvider {
    /// Creates a provider configuration with the given query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            options: Map::new(),
        }
    }
}

/// Datadog provider configuration.
///
/// The v1 API takes a single `query`; v2 takes either a `query` or a set of
/// named `queries`, optionally combined through a `formula`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatadogProvider {
    /// API version (`v1` or `v2`). Absent means `v1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Single query template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Named query templates (v2 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<BTreeMap<String, String>>,

    /// Formula combining the named queries (v2 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    /// Remaining provider settings, kept as-is.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// CloudWatch provider configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudWatchProvider {
    /// Metric data queries, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_data_queries: Option<Vec<Value>>,

    /// Remaining provider settings, kept as-is.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// A metric provider with its configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricProvider {
    /// Prometheus query.
    Prometheus(QueryProvider),
    /// Datadog query or queries.
    Datadog(DatadogProvider),
    /// Wavefront query.
    Wavefront(QueryProvider),
    /// New Relic NRQL query.
    NewRelic(QueryProvider),
    /// CloudWatch metric data queries.
    CloudWatch(CloudWatchProvider),
    /// Graphite query.
    Graphite(QueryProvider),
    /// InfluxDB query.
    Influxdb(QueryProvider),
    /// SkyWalking query.
    Skywalking(QueryProvider),
    /// A provider without transform support. The configuration is kept verbatim.
    Unsupported {
        /// Wire key of the provider, empty if the object had no keys.
        name: String,
        /// Provider configuration.
        config: Value,
    },
}

impl MetricProvider {
    /// Creates a Prometheus provider with the given query.
    #[must_use]
    pub fn prometheus(query: impl Into<String>) -> Self {
        Self::Prometheus(QueryProvider::new(query))
    }

    /// Creates a New Relic provider with the given query.
    #[must_use]
    pub fn new_relic(query: impl Into<String>) -> Self {
        Self::NewRelic(QueryProvider::new(query))
    }

    /// Returns the provider type tag.
    #[must_use]
    pub const fn provider_type(&self) -> ProviderType {
        match self {
            Self::Prometheus(_) => ProviderType::Prometheus,
            Self::Datadog(_) => ProviderType::Datadog,
            Self::Wavefront(_) => ProviderType::Wavefront,
            Self::NewRelic(_) => ProviderType::NewRelic,
            Self::CloudWatch(_) => ProviderType::CloudWatch,
            Self::Graphite(_) => ProviderType::Graphite,
            Self::Influxdb(_) => ProviderType::Influxdb,
            Self::Skywalking(_) => ProviderType::Skywalking,
            Self::Unsupported { .. } => ProviderType::Unsupported,
        }
    }

    fn from_entry(provider_type: ProviderType, body: Value) -> Result<Self, serde_json::Error> {
        let body = if body.is_null() {
            Value::Object(Map::new())
        } else {
            body
        };

        Ok(match provider_type {
            ProviderType::Prometheus => Self::Prometheus(serde_json::from_value(body)?),
            ProviderType::Datadog => Self::Datadog(serde_json::from_value(body)?),
            ProviderType::Wavefront => Self::Wavefront(serde_json::from_value(body)?),
            ProviderType::NewRelic => Self::NewRelic(serde_json::from_value(body)?),
            ProviderType::CloudWatch => Self::CloudWatch(serde_json::from_value(body)?),
            ProviderType::Graphite => Self::Graphite(serde_json::from_value(body)?),
            ProviderType::Influxdb => Self::Influxdb(serde_json::from_value(body)?),
            ProviderType::Skywalking => Self::Skywalking(serde_json::from_value(body)?),
            ProviderType::Unsupported => Self::Unsupported {
                name: String::new(),
                config: body,
            },
        })
    }

    fn to_entry(&self) -> Result<(&str, Value), serde_json::Error> {
        let body = match self {
            Self::Prometheus(p)
            | Self::Wavefront(p)
            | Self::NewRelic(p)
            | Self::Graphite(p)
            | Self::Influxdb(p)
            | Self::Skywalking(p) => serde_json::to_value(p)?,
            Self::Datadog(p) => serde_json::to_value(p)?,
            Self::CloudWatch(p) => serde_json::to_value(p)?,
            Self::Unsupported { name, config } => return Ok((name.as_str(), config.clone())),
        };
        Ok((self.provider_type().as_str(), body))
    }
}

impl<'de> Deserialize<'de> for MetricProvider {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Map::<String, Value>::deserialize(deserializer)?;

        let recognized = entries
            .iter()
            .find_map(|(key, body)| ProviderType::from_key(key).map(|t| (t, body.clone())));

        match recognized {
            Some((provider_type, body)) => {
                Self::from_entry(provider_type, body).map_err(de::Error::custom)
            }
            None => {
                let (name, config) = entries
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| (String::new(), Value::Null));
                Ok(Self::Unsupported { name, config })
            }
        }
    }
}

impl Serialize for MetricProvider {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (key, body) = self.to_entry().map_err(serde::ser::Error::custom)?;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(key, &body)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_prometheus() {
        let provider: MetricProvider = serde_json::from_value(json!({
            "prometheus": {"address": "http://prometheus:9090", "query": "sum(up)"}
        }))
        .unwrap();

        assert_eq!(provider.provider_type(), ProviderType::Prometheus);
        match provider {
            MetricProvider::Prometheus(p) => {
                assert_eq!(p.query.as_deref(), Some("sum(up)"));
                assert_eq!(p.options.get("address"), Some(&json!("http://prometheus:9090")));
            }
            _ => panic!("Expected prometheus provider"),
        }
    }

    #[test]
    fn test_deserialize_datadog_v2_queries() {
        let provider: MetricProvider = serde_json::from_value(json!({
            "datadog": {
                "apiVersion": "v2",
                "queries": {"a": "sum:requests{*}", "b": "sum:errors{*}"},
                "formula": "b / a"
            }
        }))
        .unwrap();

        match provider {
            MetricProvider::Datadog(d) => {
                assert_eq!(d.api_version.as_deref(), Some("v2"));
                assert_eq!(d.queries.unwrap().len(), 2);
                assert_eq!(d.formula.as_deref(), Some("b / a"));
            }
            _ => panic!("Expected datadog provider"),
        }
    }

    #[test]
    fn test_deserialize_unknown_provider() {
        let provider: MetricProvider =
            serde_json::from_value(json!({"job": {"spec": {"backoffLimit": 1}}})).unwrap();

        assert_eq!(provider.provider_type(), ProviderType::Unsupported);
        match provider {
            MetricProvider::Unsupported { name, config } => {
                assert_eq!(name, "job");
                assert_eq!(config, json!({"spec": {"backoffLimit": 1}}));
            }
            _ => panic!("Expected unsupported provider"),
        }
    }

    #[test]
    fn test_deserialize_empty_provider() {
        let provider: MetricProvider = serde_json::from_value(json!({})).unwrap();
        assert_eq!(provider.provider_type(), ProviderType::Unsupported);
    }

    #[test]
    fn test_deserialize_null_body() {
        let provider: MetricProvider = serde_json::from_value(json!({"wavefront": null})).unwrap();
        assert_eq!(provider, MetricProvider::Wavefront(QueryProvider::default()));
    }

    #[test]
    fn test_serialize_keeps_wire_shape() {
        let json = json!({"newRelic": {"profile": "default", "query": "SELECT count(*) FROM Transaction"}});
        let provider: MetricProvider = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(serde_json::to_value(&provider).unwrap(), json);
    }

    #[test]
    fn test_provider_type_from_key() {
        assert_eq!(ProviderType::from_key("cloudWatch"), Some(ProviderType::CloudWatch));
        assert_eq!(ProviderType::from_key("kayenta"), None);
        assert_eq!(ProviderType::Influxdb.to_string(), "influxdb");
    }
}
