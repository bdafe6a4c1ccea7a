//! Legacy agent dialect
//!
//! Files in this dialect carry a top level `jmx:` list. Each entry names a
//! full object name, an optional metric name root that may reference object
//! name properties as `{key}`, and groups of comma separated attributes:
//!
//! ```yaml
//! name: Simple JMX File
//! version: 1.0
//! enabled: true
//! jmx:
//!   - object_name: WebSphere:type=ORB,node=*,process=*,name=*,*
//!     root_metric_name: ORB/{type}
//!     metrics:
//!       - attributes: ConcurrentRequestCount, LookupTime
//!         type: simple
//! ```
//!
//! Every entry becomes its own [`DomainDefinition`] holding a single bean;
//! entries that share a domain are not merged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::Dialect;
use crate::error::{ParseError, ParseResult};
use crate::model::{AttributeRequest, BeanRequest, DomainDefinition, MetricType};
use crate::naming::{legacy_event_type, legacy_metric_name};
use crate::pattern::AttributeSelector;

static JMX_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^jmx:").expect("jmx key pattern is valid"));

/// Legacy agent file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<f32>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub jmx: Vec<JmxEntry>,
}

/// One `jmx` list entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JmxEntry {
    #[serde(default)]
    pub object_name: String,
    #[serde(default)]
    pub root_metric_name: String,
    #[serde(default)]
    pub metrics: Vec<MetricGroup>,
}

/// A comma separated attribute list sharing one type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricGroup {
    #[serde(default)]
    pub attributes: String,
    #[serde(default, rename = "type")]
    pub metric_type: String,
}

/// Whether `raw` has a `jmx:` key at the start of any line, ignoring case
///
/// This is a textual check only and does not validate the document.
pub fn detect(raw: &str) -> bool {
    JMX_KEY.is_match(raw)
}

/// Decode a legacy agent document
pub fn decode(raw: &str) -> ParseResult<LegacyDocument> {
    serde_yaml::from_str(raw).map_err(|source| ParseError::Schema {
        dialect: Dialect::LegacyAgent,
        source,
    })
}

/// Decode and normalize a legacy agent document
pub fn parse(raw: &str) -> ParseResult<Vec<DomainDefinition>> {
    let document = decode(raw)?;
    normalize(&document)
}

/// Build one domain definition per `jmx` entry
pub fn normalize(document: &LegacyDocument) -> ParseResult<Vec<DomainDefinition>> {
    if document.enabled == Some(false) {
        tracing::debug!(name = %document.name, "Legacy file is marked disabled; collecting anyway");
    }

    document
        .jmx
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(&document.name, index, entry))
        .collect()
}

fn normalize_entry(config_name: &str, index: usize, entry: &JmxEntry) -> ParseResult<DomainDefinition> {
    let context = format!("jmx entry #{}", index);

    let (domain, query) = entry.object_name.split_once(':').ok_or_else(|| {
        ParseError::validation(
            &context,
            format!(
                "object_name '{}' must have the form <domain>:<query>",
                entry.object_name
            ),
        )
    })?;

    if domain.is_empty() || query.is_empty() {
        return Err(ParseError::validation(
            &context,
            format!(
                "object_name '{}' must have a non-empty domain and query",
                entry.object_name
            ),
        ));
    }

    let mut attributes = Vec::new();
    for group in &entry.metrics {
        let metric_type = MetricType::from_legacy(&group.metric_type);

        for name in group.attributes.split(',').map(str::trim) {
            if name.is_empty() {
                continue;
            }

            let selector = AttributeSelector::Literal(name.to_string());
            let attr_regexp =
                selector.compile(&format!("attribute '{}' of {}", name, context))?;

            attributes.push(AttributeRequest {
                attr_regexp,
                metric_name: legacy_metric_name(name, &entry.root_metric_name, query),
                metric_type: Some(metric_type),
            });
        }
    }

    tracing::debug!(
        domain = domain,
        query = query,
        attributes = attributes.len(),
        "Decoded legacy jmx entry"
    );

    Ok(DomainDefinition {
        domain: domain.to_string(),
        event_type: legacy_event_type(config_name, domain),
        beans: vec![BeanRequest {
            bean_query: query.to_string(),
            exclude: Vec::new(),
            attributes,
        }],
    })
}
