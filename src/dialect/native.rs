//! Native collection dialect
//!
//! ```yaml
//! collect:
//!   - domain: java.lang
//!     event_type: JVMSample
//!     beans:
//!       - query: type=GarbageCollector,name=*
//!         exclude_regex:
//!           - name=PS.*
//!         attributes:
//!           - CollectionCount
//!           - attr: CollectionTime
//!             metric_type: delta
//!             metric_name: GC/CollectionTime
//!           - attr_regex: "Last.*"
//! ```
//!
//! Detection accepts every input, so this dialect must be registered last.

use regex::Regex;
use serde::Deserialize;

use super::Dialect;
use crate::error::{ParseError, ParseResult};
use crate::model::{AttributeRequest, BeanRequest, DomainDefinition, MetricType};
use crate::pattern::{exclude_regex, AttributeSelector, ExcludeSpec};

/// Native collection file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionDocument {
    #[serde(default)]
    pub collect: Vec<DomainEntry>,
}

/// One `collect` list entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainEntry {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub beans: Vec<BeanEntry>,
}

/// One bean query with its filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeanEntry {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub exclude_regex: Option<ExcludeField>,
    #[serde(default)]
    pub attributes: Vec<AttributeEntry>,
}

/// `exclude_regex` accepts a single pattern or a list of patterns
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExcludeField {
    Single(String),
    Many(Vec<String>),
}

/// An attribute given either by bare name or as a map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttributeEntry {
    Name(String),
    Detailed(AttributeMap),
}

/// Map form of an attribute entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeMap {
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub attr_regex: Option<String>,
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub metric_type: Option<String>,
}

impl From<Option<ExcludeField>> for ExcludeSpec {
    fn from(field: Option<ExcludeField>) -> Self {
        match field {
            None => ExcludeSpec::Absent,
            Some(ExcludeField::Single(pattern)) => ExcludeSpec::Single(pattern),
            Some(ExcludeField::Many(patterns)) => ExcludeSpec::Many(patterns),
        }
    }
}

/// A validated map-form attribute, before pattern compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub selector: AttributeSelector,
    pub metric_name: String,
    pub metric_type: Option<MetricType>,
}

impl AttributeEntry {
    /// Resolve the entry into exactly one selector plus naming and type
    pub fn to_spec(&self, context: &str) -> ParseResult<AttributeSpec> {
        let map = match self {
            AttributeEntry::Name(name) => {
                return Ok(AttributeSpec {
                    selector: AttributeSelector::Literal(name.clone()),
                    metric_name: String::new(),
                    metric_type: None,
                })
            }
            AttributeEntry::Detailed(map) => map,
        };

        let selector = match (&map.attr, &map.attr_regex) {
            (Some(name), None) => AttributeSelector::Literal(name.clone()),
            (None, Some(pattern)) => AttributeSelector::Pattern(pattern.clone()),
            _ => {
                return Err(ParseError::validation(
                    context,
                    "must specify one of attr or attr_regex for every attribute",
                ))
            }
        };

        let metric_type = map
            .metric_type
            .as_deref()
            .map(str::parse::<MetricType>)
            .transpose()
            .map_err(|reason| ParseError::validation(context, reason))?;

        Ok(AttributeSpec {
            selector,
            metric_name: map.metric_name.clone().unwrap_or_default(),
            metric_type,
        })
    }
}

/// Decode a native document without semantic validation
pub fn decode(raw: &str) -> ParseResult<CollectionDocument> {
    serde_yaml::from_str(raw).map_err(|source| ParseError::Schema {
        dialect: Dialect::Native,
        source,
    })
}

/// Decode, validate and normalize a native document
///
/// Alongside the domains, returns the errors of beans that were dropped
/// without failing the document.
pub fn parse(raw: &str) -> ParseResult<(Vec<DomainDefinition>, Vec<ParseError>)> {
    let document = decode(raw)?;
    normalize(&document)
}

/// Validate a decoded document and build its domain definitions
pub fn normalize(
    document: &CollectionDocument,
) -> ParseResult<(Vec<DomainDefinition>, Vec<ParseError>)> {
    let mut skipped = Vec::new();
    let domains = document
        .collect
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_domain(index, entry, &mut skipped))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok((domains, skipped))
}

fn normalize_domain(
    index: usize,
    entry: &DomainEntry,
    skipped: &mut Vec<ParseError>,
) -> ParseResult<DomainDefinition> {
    if entry.domain.is_empty() {
        return Err(ParseError::validation(
            format!("collect entry #{}", index),
            "domain must not be empty",
        ));
    }

    let mut beans = Vec::with_capacity(entry.beans.len());
    for (bean_index, bean) in entry.beans.iter().enumerate() {
        let context = format!("bean #{} of domain '{}'", bean_index, entry.domain);
        if let Some(request) = normalize_bean(&context, bean, skipped)? {
            beans.push(request);
        }
    }

    let event_type = if entry.event_type.is_empty() {
        entry.domain.clone()
    } else {
        entry.event_type.clone()
    };

    tracing::debug!(
        domain = %entry.domain,
        event_type = %event_type,
        beans = beans.len(),
        "Decoded collection domain"
    );

    Ok(DomainDefinition {
        domain: entry.domain.clone(),
        event_type,
        beans,
    })
}

/// Returns `Ok(None)` when the bean is dropped for a bad single exclude
/// pattern; the error is pushed onto `skipped`
fn normalize_bean(
    context: &str,
    bean: &BeanEntry,
    skipped: &mut Vec<ParseError>,
) -> ParseResult<Option<BeanRequest>> {
    if bean.query.is_empty() {
        return Err(ParseError::validation(context, "query must not be empty"));
    }

    let context = format!("{} (query '{}')", context, bean.query);

    let exclude = match compile_excludes(&context, bean.exclude_regex.clone().into()) {
        Ok(exclude) => exclude,
        Err(ExcludeFailure::Recoverable(err)) => {
            tracing::debug!(error = %err, "Dropping bean with invalid exclude_regex");
            skipped.push(err);
            return Ok(None);
        }
        Err(ExcludeFailure::Fatal(err)) => return Err(err),
    };

    let attributes = normalize_attributes(&context, &bean.attributes)?;

    Ok(Some(BeanRequest {
        bean_query: bean.query.clone(),
        exclude,
        attributes,
    }))
}

enum ExcludeFailure {
    /// Only the offending bean is dropped
    Recoverable(ParseError),
    /// The whole parse is aborted
    Fatal(ParseError),
}

// A bad single pattern drops the bean; a bad pattern inside a list fails the
// whole file.
fn compile_excludes(context: &str, spec: ExcludeSpec) -> Result<Vec<Regex>, ExcludeFailure> {
    match spec {
        ExcludeSpec::Absent => Ok(Vec::new()),
        ExcludeSpec::Single(pattern) => exclude_regex(&pattern, context)
            .map(|r| vec![r])
            .map_err(ExcludeFailure::Recoverable),
        ExcludeSpec::Many(patterns) => patterns
            .iter()
            .map(|p| exclude_regex(p, context))
            .collect::<ParseResult<Vec<_>>>()
            .map_err(ExcludeFailure::Fatal),
    }
}

fn normalize_attributes(context: &str, entries: &[AttributeEntry]) -> ParseResult<Vec<AttributeRequest>> {
    // No attributes listed means collect everything
    if entries.is_empty() {
        return Ok(vec![AttributeRequest {
            attr_regexp: AttributeSelector::all().compile(context)?,
            metric_name: String::new(),
            metric_type: None,
        }]);
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let context = format!("attribute #{} of {}", index, context);
            let spec = entry.to_spec(&context)?;
            Ok(AttributeRequest {
                attr_regexp: spec.selector.compile(&context)?,
                metric_name: spec.metric_name,
                metric_type: spec.metric_type,
            })
        })
        .collect()
}
