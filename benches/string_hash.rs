//! Benchmarks for the string-hash engine.
//!
//! Measures matching throughput as the number of registered expressions grows,
//! and the cost of registration itself.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use expr_match::ir::{ExpressionPart, GroupId, Predicate, OPTIMIZE_NONE};
use expr_match::{EngineConfig, MatchResult, MatchingEngine, StringHashEngine};
use serde_json::{json, Value};
use std::hint::black_box;
use std::time::Duration;
use uuid::Uuid;

const FIELDS: [&str; 8] = [
    "event.name",
    "event.data.status",
    "event.data.plan",
    "event.data.region",
    "event.data.account_id",
    "event.user.email",
    "event.data.source",
    "event.data.kind",
];

/// Parts spread over a fixed set of field paths, one in five negated.
fn create_parts(count: usize) -> Vec<ExpressionPart> {
    (0..count)
        .map(|i| {
            let field = FIELDS[i % FIELDS.len()];
            let literal = format!("value-{}", i % 500);
            let predicate = if i % 5 == 0 {
                Predicate::not_equals(field, literal)
            } else {
                Predicate::equals(field, literal)
            };
            ExpressionPart::new(Uuid::new_v4(), GroupId::new(1, OPTIMIZE_NONE), predicate)
        })
        .collect()
}

fn create_events(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "event": {
                    "name": format!("value-{}", i % 500),
                    "user": {"email": format!("user{i}@example.com")},
                    "data": {
                        "status": format!("value-{}", (i * 7) % 500),
                        "plan": "free",
                        "region": format!("value-{}", (i * 3) % 500),
                        "account_id": format!("acct-{i}"),
                        "source": "api",
                        "kind": format!("value-{}", i % 17)
                    }
                }
            })
        })
        .collect()
}

fn create_engine(concurrency: i64, parts: &[ExpressionPart]) -> StringHashEngine {
    let engine = StringHashEngine::with_config(EngineConfig::new().with_concurrency(concurrency))
        .expect("Failed to create engine");
    for part in parts {
        engine.add(part).expect("Failed to add part");
    }
    engine
}

fn benchmark_match_scaling(c: &mut Criterion) {
    let events = create_events(100);
    let mut group = c.benchmark_group("match_scaling");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(events.len() as u64));

    for expression_count in [100, 1_000, 10_000, 50_000] {
        let engine = create_engine(4, &create_parts(expression_count));

        group.bench_with_input(
            BenchmarkId::from_parameter(expression_count),
            &engine,
            |b, engine| {
                b.iter(|| {
                    for event in &events {
                        let result = MatchResult::new();
                        engine
                            .match_event(black_box(event), &result)
                            .expect("match failed");
                        black_box(result.len());
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_concurrency(c: &mut Criterion) {
    let events = create_events(100);
    let parts = create_parts(10_000);
    let mut group = c.benchmark_group("match_concurrency");
    group.throughput(Throughput::Elements(events.len() as u64));

    for concurrency in [1, 2, 4, 8, 0] {
        let engine = create_engine(concurrency, &parts);
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &engine,
            |b, engine| {
                b.iter(|| {
                    for event in &events {
                        let result = MatchResult::new();
                        engine
                            .match_event(black_box(event), &result)
                            .expect("match failed");
                    }
                });
            },
        );
    }

    group.finish();
}

fn benchmark_registration(c: &mut Criterion) {
    let parts = create_parts(10_000);
    let mut group = c.benchmark_group("registration");
    group.throughput(Throughput::Elements(parts.len() as u64));

    group.bench_function("add_remove_10k", |b| {
        b.iter(|| {
            let engine = create_engine(1, &parts);
            for part in &parts {
                engine.remove(black_box(part)).expect("remove failed");
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_match_scaling,
    benchmark_concurrency,
    benchmark_registration
);
criterion_main!(benches);
