//! Benchmarks for the backlog tracer
//!
//! Compares the interceptor hot path with tracing disabled and enabled, and
//! measures store pushes once the backlog is full.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use backlog_core::pipeline::processor_fn;
use backlog_core::{
    BacklogEvent, BacklogStore, BacklogTracer, Exchange, MessageSnapshot, NodeDefinition,
    Pipeline, Processor, RouteBuilder, RouteDefinition, TracerConfig,
};

fn traced_pipeline(tracer: &BacklogTracer, nodes: usize) -> Pipeline {
    let route = (0..nodes).fold(RouteDefinition::new().with_id("bench"), |route, _| {
        route.to(NodeDefinition::new("to"), processor_fn(|_| Ok(())))
    });
    RouteBuilder::new()
        .intercept(Arc::new(tracer.clone()))
        .build(&route)
}

fn bench_interceptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("interceptor");

    for enabled in [false, true] {
        let tracer = BacklogTracer::with_config(TracerConfig::default().enabled(enabled))
            .expect("valid config");
        let pipeline = traced_pipeline(&tracer, 5);
        let template = Exchange::with_body(json!({"order": 42, "items": [1, 2, 3]}))
            .header("orderId", "ORD-0042")
            .header("priority", "high");

        let label = if enabled { "enabled" } else { "disabled" };
        group.bench_with_input(BenchmarkId::new("five_nodes", label), &template, |b, template| {
            b.iter(|| {
                let mut exchange = template.clone();
                pipeline.process(black_box(&mut exchange)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");

    let message = MessageSnapshot::capture(&Exchange::with_body("payload"), "to1", 0)
        .expect("text body captures");
    let store = BacklogStore::new(1000);
    for i in 0..1000 {
        store.push(BacklogEvent::new(i, None, "to1".to_string(), false, message.clone()));
    }

    group.bench_function("push_full", |b| {
        let mut i = 1000;
        b.iter(|| {
            i += 1;
            store.push(BacklogEvent::new(i, None, "to1".to_string(), false, message.clone()))
        })
    });

    group.bench_function("snapshot_1000", |b| b.iter(|| black_box(store.snapshot())));

    group.finish();
}

criterion_group!(benches, bench_interceptor, bench_store);
criterion_main!(benches);
