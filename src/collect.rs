//! Query engine boundary and metric emission
//!
//! The JMX connection and the bean queries themselves are owned by an
//! external engine implementing [`QueryEngine`]. This module turns the rows
//! the engine returns into metric sets using the parsed
//! [`DomainDefinition`]s, and enforces the per-entity metric limit.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::JmxConfig;
use crate::error::CollectError;
use crate::model::{BeanRequest, DomainDefinition, MetricType};

/// Raw attribute value returned by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl AttributeValue {
    /// Type used when the request leaves it unspecified
    pub fn inferred_type(&self) -> MetricType {
        match self {
            AttributeValue::Number(_) => MetricType::Gauge,
            AttributeValue::Text(_) | AttributeValue::Boolean(_) => MetricType::Attribute,
        }
    }
}

/// One attribute of one bean, as returned by a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub object_name: String,
    pub attribute: String,
    pub value: AttributeValue,
}

impl QueryRow {
    pub fn new(
        object_name: impl Into<String>,
        attribute: impl Into<String>,
        value: AttributeValue,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            attribute: attribute.into(),
            value,
        }
    }

    /// Key that attribute patterns are matched against
    pub fn key(&self) -> String {
        format!("{},attr={}", self.object_name, self.attribute)
    }
}

/// External JMX query engine
pub trait QueryEngine {
    type Connection;

    /// Open a connection using the configured host, credentials and TLS options
    fn connect(&mut self, config: &JmxConfig) -> Result<Self::Connection, CollectError>;

    /// Return every attribute of every bean matching `object_pattern`
    fn query(
        &mut self,
        connection: &mut Self::Connection,
        object_pattern: &str,
        timeout: Duration,
    ) -> Result<Vec<QueryRow>, CollectError>;

    fn close(&mut self, connection: Self::Connection);
}

/// A single emitted metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub value: AttributeValue,
    pub metric_type: MetricType,
}

/// Metrics collected from one bean
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    pub event_type: String,
    pub domain: String,
    pub bean: String,
    pub metrics: BTreeMap<String, Metric>,
}

/// Query every bean of `domain` and build one metric set per matched bean
pub fn collect_domain<E: QueryEngine>(
    engine: &mut E,
    connection: &mut E::Connection,
    domain: &DomainDefinition,
    timeout: Duration,
) -> Result<Vec<MetricSet>, CollectError> {
    let mut sets: BTreeMap<String, MetricSet> = BTreeMap::new();

    for bean in &domain.beans {
        let object_pattern = format!("{}:{}", domain.domain, bean.bean_query);
        let rows = engine.query(connection, &object_pattern, timeout)?;

        tracing::debug!(query = %object_pattern, rows = rows.len(), "Queried beans");

        for row in rows {
            let Some((name, metric)) = to_metric(bean, &row) else {
                continue;
            };

            sets.entry(row.object_name.clone())
                .or_insert_with(|| MetricSet {
                    event_type: domain.event_type.clone(),
                    domain: domain.domain.clone(),
                    bean: row.object_name.clone(),
                    metrics: BTreeMap::new(),
                })
                .metrics
                .insert(name, metric);
        }
    }

    Ok(sets.into_values().collect())
}

fn to_metric(bean: &BeanRequest, row: &QueryRow) -> Option<(String, Metric)> {
    if bean.is_excluded(&row.object_name) {
        return None;
    }

    let key = row.key();
    let request = bean.attributes.iter().find(|a| a.attr_regexp.is_match(&key))?;

    let name = if request.metric_name.is_empty() {
        row.attribute.clone()
    } else {
        request.metric_name.clone()
    };
    let metric_type = request
        .metric_type
        .unwrap_or_else(|| row.value.inferred_type());

    Some((
        name,
        Metric {
            value: row.value.clone(),
            metric_type,
        },
    ))
}

/// Collect every domain, skipping domains whose queries fail
pub fn collect_all<E: QueryEngine>(
    engine: &mut E,
    connection: &mut E::Connection,
    domains: &[DomainDefinition],
    timeout: Duration,
) -> Vec<MetricSet> {
    let mut sets = Vec::new();
    for domain in domains {
        match collect_domain(engine, connection, domain, timeout) {
            Ok(collected) => sets.extend(collected),
            Err(e) => {
                tracing::error!(domain = %domain.domain, error = %e, "Failed to collect domain");
            }
        }
    }
    sets
}

/// Drop every entity whose metric count exceeds `limit`
///
/// Entities are keyed by domain. A limit of 0 disables the check.
pub fn apply_metric_limit(sets: Vec<MetricSet>, limit: usize) -> Vec<MetricSet> {
    if limit == 0 {
        return sets;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for set in &sets {
        *counts.entry(set.domain.as_str()).or_default() += set.metrics.len();
    }

    let over: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > limit)
        .map(|(domain, count)| {
            tracing::warn!(
                domain = domain,
                metrics = count,
                limit = limit,
                "Domain exceeds the metric limit and will not be reported"
            );
            domain.to_string()
        })
        .collect();

    sets.into_iter()
        .filter(|set| !over.contains(&set.domain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::native;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StaticEngine {
        rows: HashMap<String, Vec<QueryRow>>,
        queries: Vec<String>,
    }

    impl StaticEngine {
        fn with(mut self, pattern: &str, rows: Vec<QueryRow>) -> Self {
            self.rows.insert(pattern.to_string(), rows);
            self
        }
    }

    impl QueryEngine for StaticEngine {
        type Connection = ();

        fn connect(&mut self, _config: &JmxConfig) -> Result<(), CollectError> {
            Ok(())
        }

        fn query(
            &mut self,
            _connection: &mut (),
            object_pattern: &str,
            _timeout: Duration,
        ) -> Result<Vec<QueryRow>, CollectError> {
            self.queries.push(object_pattern.to_string());
            self.rows
                .get(object_pattern)
                .cloned()
                .ok_or_else(|| CollectError::Query {
                    query: object_pattern.to_string(),
                    reason: "no such bean".to_string(),
                })
        }

        fn close(&mut self, _connection: ()) {}
    }

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn gc_rows() -> Vec<QueryRow> {
        vec![
            QueryRow::new("java.lang:type=GarbageCollector,name=G1", "CollectionCount", AttributeValue::Number(4.0)),
            QueryRow::new("java.lang:type=GarbageCollector,name=G1", "Name", AttributeValue::Text("G1".into())),
            QueryRow::new("java.lang:type=GarbageCollector,name=G1", "Valid", AttributeValue::Boolean(true)),
            QueryRow::new("java.lang:type=GarbageCollector,name=PS", "CollectionCount", AttributeValue::Number(9.0)),
        ]
    }

    #[test]
    fn test_row_key() {
        let row = QueryRow::new("a:type=B", "Count", AttributeValue::Number(1.0));
        assert_eq!(row.key(), "a:type=B,attr=Count");
    }

    #[test]
    fn test_collect_domain_infers_unspecified_types() {
        let (domains, _) = native::parse(
            "collect:\n  - domain: java.lang\n    beans:\n      - query: type=GarbageCollector,name=*\n        exclude_regex: name=PS\n",
        )
        .unwrap();
        let mut engine = StaticEngine::default().with("java.lang:type=GarbageCollector,name=*", gc_rows());
        let mut conn = engine.connect(&JmxConfig::default()).unwrap();

        let sets = collect_domain(&mut engine, &mut conn, &domains[0], TIMEOUT).unwrap();
        assert_eq!(sets.len(), 1);

        let set = &sets[0];
        assert_eq!(set.bean, "java.lang:type=GarbageCollector,name=G1");
        assert_eq!(set.event_type, "java.lang");
        assert_eq!(set.metrics["CollectionCount"].metric_type, MetricType::Gauge);
        assert_eq!(set.metrics["Name"].metric_type, MetricType::Attribute);
        assert_eq!(set.metrics["Valid"].metric_type, MetricType::Attribute);
    }

    #[test]
    fn test_collect_domain_uses_requested_names_and_types() {
        let (domains, _) = native::parse(
            r#"collect:
  - domain: java.lang
    event_type: JVMSample
    beans:
      - query: type=GarbageCollector,name=*
        attributes:
          - attr: CollectionCount
            metric_name: gc.count
            metric_type: delta
"#,
        )
        .unwrap();
        let mut engine = StaticEngine::default().with("java.lang:type=GarbageCollector,name=*", gc_rows());

        let sets = collect_domain(&mut engine, &mut (), &domains[0], TIMEOUT).unwrap();
        assert_eq!(sets.len(), 2);
        for set in &sets {
            assert_eq!(set.metrics.len(), 1);
            assert_eq!(set.metrics["gc.count"].metric_type, MetricType::Delta);
            assert_eq!(set.event_type, "JVMSample");
        }
        assert_eq!(engine.queries, vec!["java.lang:type=GarbageCollector,name=*"]);
    }

    #[test]
    fn test_collect_all_isolates_domain_failures() {
        let (domains, _) = native::parse(
            "collect:\n  - domain: missing\n    beans:\n      - query: type=X\n  - domain: java.lang\n    beans:\n      - query: type=GarbageCollector,name=*\n",
        )
        .unwrap();
        let mut engine = StaticEngine::default().with("java.lang:type=GarbageCollector,name=*", gc_rows());

        let sets = collect_all(&mut engine, &mut (), &domains, TIMEOUT);
        assert_eq!(sets.len(), 2);
        assert!(sets.iter().all(|s| s.domain == "java.lang"));
    }

    fn set(domain: &str, bean: &str, metrics: usize) -> MetricSet {
        MetricSet {
            event_type: domain.to_string(),
            domain: domain.to_string(),
            bean: bean.to_string(),
            metrics: (0..metrics)
                .map(|i| {
                    (
                        format!("m{i}"),
                        Metric {
                            value: AttributeValue::Number(i as f64),
                            metric_type: MetricType::Gauge,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_metric_limit_drops_whole_entity() {
        let sets = vec![set("a", "a:x=1", 2), set("a", "a:x=2", 2), set("b", "b:x=1", 3)];
        let kept = apply_metric_limit(sets, 3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].domain, "b");
    }

    #[test]
    fn test_metric_limit_zero_is_unlimited() {
        let sets = vec![set("a", "a:x=1", 500)];
        assert_eq!(apply_metric_limit(sets, 0).len(), 1);
    }
}
