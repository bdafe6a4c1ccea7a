//! Parse benchmark
//!
//! Dispatch and normalization cost for both dialects

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use jmx_collect::DialectRegistry;

fn benchmark_parse(c: &mut Criterion) {
    let legacy = r#"
name: Tomcat Pools
version: 1.0
enabled: true
jmx:
  - object_name: Catalina:type=ThreadPool,name=*
    root_metric_name: "ThreadPool/{name}"
    metrics:
      - attributes: currentThreadCount, currentThreadsBusy, maxThreads
        type: simple
      - attributes: connectionCount
        type: monotonically_increasing
  - object_name: Catalina:type=Manager,context=*,host=localhost
    root_metric_name: "Sessions/{host}/{context}"
    metrics:
      - attributes: activeSessions, sessionCounter, expiredSessions
"#;

    let native = r#"
collect:
  - domain: java.lang
    event_type: JVMSample
    beans:
      - query: type=GarbageCollector,name=*
        exclude_regex:
          - name=PS.*
        attributes:
          - CollectionCount
          - attr: CollectionTime
            metric_type: delta
      - query: type=Memory
        attributes:
          - attr_regex: "(Heap|NonHeap)MemoryUsage\\..*"
      - query: type=Threading
"#;

    let registry = DialectRegistry::standard();
    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("legacy", "tomcat"), &legacy, |b, raw| {
        b.iter(|| registry.parse(raw, "bench"))
    });

    group.bench_with_input(BenchmarkId::new("native", "jvm"), &native, |b, raw| {
        b.iter(|| registry.parse(raw, "bench"))
    });

    group.bench_with_input(BenchmarkId::new("dispatch", "native"), &native, |b, raw| {
        b.iter(|| registry.dispatch(raw, "bench"))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse);
criterion_main!(benches);
