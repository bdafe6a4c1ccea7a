//! Canonical collection request model
//!
//! Both configuration dialects decode into these types. They are built once
//! per parse and never mutated afterwards.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::str::FromStr;

/// Semantic interpretation of a collected value
///
/// An absent metric type is represented as `Option<MetricType>::None` on
/// [`AttributeRequest`] and is resolved by the emitter from the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Instantaneous value
    Gauge,
    /// Monotonically increasing counter, reported as a delta
    Delta,
    /// Opaque, non-numeric attribute
    Attribute,
    /// Per-second rate
    Rate,
}

impl MetricType {
    /// Returns the native dialect spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Delta => "delta",
            MetricType::Attribute => "attribute",
            MetricType::Rate => "rate",
        }
    }

    /// Map a legacy agent `type` value
    ///
    /// Matching ignores case and surrounding whitespace. Anything
    /// unrecognised, including an empty value, maps to `Gauge`.
    pub fn from_legacy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "simple" => MetricType::Gauge,
            "monotonically_increasing" => MetricType::Delta,
            "attribute" => MetricType::Attribute,
            _ => MetricType::Gauge,
        }
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge" => Ok(MetricType::Gauge),
            "delta" => Ok(MetricType::Delta),
            "attribute" => Ok(MetricType::Attribute),
            "rate" => Ok(MetricType::Rate),
            other => Err(format!(
                "invalid metric type '{}', expected one of: gauge, delta, attribute, rate",
                other
            )),
        }
    }
}

impl Serialize for MetricType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated collection parameters for a single JMX domain
#[derive(Debug, Clone, Serialize)]
pub struct DomainDefinition {
    /// JMX domain name
    pub domain: String,
    /// Name of the emitted metric set
    pub event_type: String,
    /// Bean queries within the domain, in file order
    pub beans: Vec<BeanRequest>,
}

/// Information needed to query a JMX endpoint and filter the results
#[derive(Debug, Clone, Serialize)]
pub struct BeanRequest {
    /// Object name pattern, may contain `*` wildcards
    pub bean_query: String,
    /// Beans whose object name matches any of these are skipped
    #[serde(serialize_with = "serialize_regexes")]
    pub exclude: Vec<Regex>,
    /// Attribute selectors, in file order
    pub attributes: Vec<AttributeRequest>,
}

impl BeanRequest {
    /// Whether a bean with the given object name is excluded
    pub fn is_excluded(&self, object_name: &str) -> bool {
        self.exclude.iter().any(|r| r.is_match(object_name))
    }
}

/// Information needed to turn a JMX attribute into a metric
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRequest {
    /// Anchored pattern matched against `...,attr=<name>`
    #[serde(rename = "attr_regex", serialize_with = "serialize_regex")]
    pub attr_regexp: Regex,
    /// Output name; empty means the raw attribute name is used
    pub metric_name: String,
    /// `None` when the type is left to the emitter
    pub metric_type: Option<MetricType>,
}

impl AttributeRequest {
    /// Source of the compiled attribute pattern
    pub fn pattern(&self) -> &str {
        self.attr_regexp.as_str()
    }
}

fn serialize_regex<S>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(regex.as_str())
}

fn serialize_regexes<S>(regexes: &[Regex], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(regexes.iter().map(Regex::as_str))
}
