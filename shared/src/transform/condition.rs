//! Success/failure condition parsing.
//!
//! Conditions are expressions over a provider's result such as
//! `result[0] < {{ args.threshold }} && result[0] > 0`. Each `&&`/`||`
//! separated subcondition of the form `<accessor> <operator> <literal>`
//! yields a chart threshold when the accessor shape is supported for the
//! provider, the operator is relational and the literal is a number.

use super::interpolate::interpolate;
use crate::models::{Argument, MetricProvider, ProviderType};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::anychar,
    combinator::{not, recognize},
    multi::{many0_count, separated_list1},
    sequence::preceded,
    IResult, Parser,
};
use serde::Serialize;

const AND: &str = " && ";
const OR: &str = " || ";

/// What a condition contributes to the chart and table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDetails {
    /// The interpolated condition, `None` when there is no usable condition.
    pub label: Option<String>,
    /// Numeric thresholds in order of appearance.
    pub thresholds: Vec<f64>,
    /// Condition keys in order of appearance, not deduplicated.
    pub condition_keys: Vec<String>,
}

/// Whether a provider supports an accessor, and the key it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorSupport {
    /// Whether thresholds can be extracted for this accessor.
    pub is_format_supported: bool,
    /// Key selecting the compared value inside a measurement result.
    pub condition_key: Option<String>,
}

impl AccessorSupport {
    fn new(is_format_supported: bool, condition_key: Option<&str>) -> Self {
        Self {
            is_format_supported,
            condition_key: condition_key.map(str::to_string),
        }
    }

    fn unsupported() -> Self {
        Self::new(false, None)
    }
}

/// Checks an accessor token against what a provider's results look like.
///
/// # Examples
///
/// ```
/// use shared::models::ProviderType;
/// use shared::transform::accessor_support;
///
/// let support = accessor_support(ProviderType::NewRelic, "result.p99");
/// assert!(support.is_format_supported);
/// assert_eq!(support.condition_key.as_deref(), Some("p99"));
/// ```
#[must_use]
pub fn accessor_support(provider_type: ProviderType, accessor: &str) -> AccessorSupport {
    match provider_type {
        ProviderType::Prometheus | ProviderType::Graphite | ProviderType::Influxdb => {
            AccessorSupport::new(accessor == "result[0]", Some("0"))
        }
        ProviderType::Datadog => AccessorSupport::new(
            matches!(accessor, "result" | "default(result, 0)"),
            accessor.contains('0').then_some("0"),
        ),
        ProviderType::Wavefront => AccessorSupport::new(accessor == "result", None),
        ProviderType::NewRelic => match accessor.strip_prefix("result.") {
            Some(key) => AccessorSupport::new(true, Some(key)),
            None => AccessorSupport::unsupported(),
        },
        ProviderType::CloudWatch | ProviderType::Skywalking | ProviderType::Unsupported => {
            AccessorSupport::unsupported()
        }
    }
}

/// Parses a condition into its label, thresholds and condition keys.
///
/// An absent or empty condition, or a missing or unsupported provider,
/// yields empty details.
///
/// # Examples
///
/// ```
/// use shared::models::MetricProvider;
/// use shared::transform::parse_condition;
///
/// let provider = MetricProvider::prometheus("q");
/// let details = parse_condition(Some("result[0] < 5 && result[0] > 1"), &[], Some(&provider));
///
/// assert_eq!(details.thresholds, vec![5.0, 1.0]);
/// assert_eq!(details.condition_keys, vec!["0", "0"]);
/// ```
#[must_use]
pub fn parse_condition(
    condition: Option<&str>,
    args: &[Argument],
    provider: Option<&MetricProvider>,
) -> ConditionDetails {
    let Some(condition) = condition.filter(|c| !c.is_empty()) else {
        return ConditionDetails::default();
    };
    let provider_type = match provider.map(MetricProvider::provider_type) {
        Some(ProviderType::Unsupported) | None => return ConditionDetails::default(),
        Some(provider_type) => provider_type,
    };

    let label = interpolate(Some(condition), args).unwrap_or_default();
    let mut details = ConditionDetails::default();

    for subcondition in split_subconditions(&label) {
        let tokens: Vec<&str> = subcondition.split(' ').collect();
        let [accessor, operator, literal] = tokens.as_slice() else {
            tracing::trace!(
                subcondition,
                tokens = tokens.len(),
                "Ignoring subcondition without three tokens"
            );
            continue;
        };

        let support = accessor_support(provider_type, accessor.trim());
        let is_relational = operator.contains('<') || operator.contains('>');
        let threshold = literal.parse::<f64>().ok().filter(|t| t.is_finite());

        match threshold {
            Some(threshold) if support.is_format_supported && is_relational => {
                if let Some(key) = support.condition_key {
                    details.condition_keys.push(key);
                }
                details.thresholds.push(threshold);
            }
            _ => tracing::trace!(
                subcondition,
                provider = %provider_type,
                supported = support.is_format_supported,
                is_relational,
                "Subcondition does not yield a threshold"
            ),
        }
    }

    details.label = Some(label);
    details
}

/// Splits a condition on ` && ` and ` || `, left to right.
fn split_subconditions(condition: &str) -> Vec<&str> {
    match separated_list1(separator, subcondition).parse(condition) {
        Ok((_, parts)) => parts,
        Err(_) => vec![condition],
    }
}

fn separator(input: &str) -> IResult<&str, &str> {
    alt((tag(AND), tag(OR))).parse(input)
}

/// Everything up to the next separator or the end of the condition.
fn subcondition(input: &str) -> IResult<&str, &str> {
    recognize(many0_count(preceded(not(separator), anychar))).parse(input)
}
