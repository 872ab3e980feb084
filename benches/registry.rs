//! Metric recording benchmarks
//!
//! Measures the per-request instrumentation cost: label schema resolution,
//! series lookup and the atomic update itself.
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lookup_service::{
    config::MetricsConfig,
    metrics::{LabelSet, Metrics, defs},
    shared::id::IdGuard,
};
use std::hint::black_box;
use std::time::Duration;

/// Full START → DONE cycle as the middleware performs it
fn bench_request_lifecycle(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig::default()).expect("metrics");

    c.bench_function("request_lifecycle", |b| {
        b.iter(|| {
            metrics.request_started(black_box("user"));
            metrics.request_finished(
                black_box("GET"),
                black_box("user"),
                Duration::from_micros(250),
                Some((200, "found")),
            );
        });
    });
}

/// Id conversion with success and failure inputs
fn bench_id_conversion(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig::default()).expect("metrics");
    let guard = IdGuard::new(&metrics, "note");

    let mut group = c.benchmark_group("id_conversion");
    for raw in ["42", "abc"] {
        group.bench_with_input(BenchmarkId::from_parameter(raw), raw, |b, raw| {
            b.iter(|| guard.convert(black_box(raw)));
        });
    }
    group.finish();
}

/// Registry lookup by name versus a pre-resolved handle
fn bench_registry_increment(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig::default()).expect("metrics");
    let name = metrics.name(defs::ENTITY_REQUESTS_IN_FLIGHT);
    let labels = LabelSet::new().with("entity", "user");

    c.bench_function("registry_increment_by_name", |b| {
        b.iter(|| {
            metrics
                .registry()
                .increment(black_box(&name), black_box(&labels), 1.0)
        });
    });
}

/// Exposition of a populated registry
fn bench_gather(c: &mut Criterion) {
    let metrics = Metrics::new(&MetricsConfig::default()).expect("metrics");
    for entity in ["user", "note"] {
        for i in 0..100 {
            metrics.request_started(entity);
            metrics.request_finished("GET", entity, Duration::from_millis(i), Some((200, "found")));
        }
    }

    c.bench_function("gather", |b| b.iter(|| metrics.gather()));
}

criterion_group!(
    benches,
    bench_request_lifecycle,
    bench_id_conversion,
    bench_registry_increment,
    bench_gather,
);
criterion_main!(benches);
