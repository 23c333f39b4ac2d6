//! Performance benchmarks for tilde-state operations.
//!
//! Run with: cargo bench --package tilde-state

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use tilde_state::{apply_update, DataPath, ReactiveStore, UpdateMode};
use tilde_template::{evaluate_collection, Scope};

// ============================================================================
// Helper functions to generate test data
// ============================================================================

/// Generate a flat document with N fields
fn generate_flat_doc(num_fields: usize) -> Value {
    let mut obj = serde_json::Map::new();
    for i in 0..num_fields {
        obj.insert(format!("field_{}", i), json!(i));
    }
    json!(obj)
}

/// Generate a deeply nested document and the dot path to its leaf
fn generate_nested_doc(depth: usize) -> (Value, String) {
    let mut current = json!({"value": 42});
    let mut segments = Vec::with_capacity(depth + 1);
    for i in (0..depth).rev() {
        let mut obj = serde_json::Map::new();
        let key = format!("level_{}", i);
        obj.insert(key.clone(), current);
        segments.push(key);
        current = json!(obj);
    }
    segments.reverse();
    segments.push("value".to_owned());
    (current, segments.join("."))
}

/// Generate a view whose every entry is a reference into a flat document
fn generate_reference_view(num_fields: usize) -> Value {
    let entries: serde_json::Map<String, Value> = (0..num_fields)
        .map(|i| (format!("v{}", i), json!(format!("~.field_{}", i))))
        .collect();
    Value::Object(entries)
}

// ============================================================================
// Benchmark: store updates with varying document sizes
// ============================================================================

fn bench_store_update_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_update_flat_doc");

    for num_fields in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(1));

        let mut store = ReactiveStore::new(generate_flat_doc(num_fields));
        let mut n = 0u64;

        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| {
                    n += 1;
                    black_box(store.set("field_0", json!(n)))
                });
            },
        );
    }

    group.finish();
}

fn bench_store_update_noop(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_update_noop");

    for num_fields in [10, 1000] {
        let mut store = ReactiveStore::new(generate_flat_doc(num_fields));

        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| black_box(store.set("field_0", json!(0))));
            },
        );
    }

    group.finish();
}

fn bench_apply_update_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_update_nested_doc");

    for depth in [5, 10, 20, 50] {
        let (doc, leaf) = generate_nested_doc(depth);
        let path = DataPath::parse(&leaf);
        let value = json!(43);

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                black_box(apply_update(
                    black_box(&doc),
                    black_box(&path),
                    Some(&value),
                    UpdateMode::Replace,
                ))
            });
        });
    }

    group.finish();
}

fn bench_list_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_modes");
    let list: Vec<Value> = (0..1000).map(|i| json!(i)).collect();
    let doc = json!({ "list": list });

    group.bench_function("add", |b| {
        let path = DataPath::parse("list");
        b.iter(|| apply_update(&doc, &path, Some(&json!("x")), UpdateMode::Add));
    });

    group.bench_function("remove", |b| {
        let path = DataPath::parse("list.500");
        b.iter(|| apply_update(&doc, &path, None, UpdateMode::Remove));
    });

    group.bench_function("move", |b| {
        let path = DataPath::parse("list.500");
        let increment = json!({"increment": -250});
        b.iter(|| apply_update(&doc, &path, Some(&increment), UpdateMode::Move));
    });

    group.finish();
}

// ============================================================================
// Benchmark: collection evaluation
// ============================================================================

fn bench_evaluate_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_collection");

    for num_fields in [10, 100, 1000] {
        group.throughput(Throughput::Elements(num_fields as u64));

        let doc = generate_flat_doc(num_fields);
        let view = generate_reference_view(num_fields);

        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                let scope = Scope::root(&doc);
                b.iter(|| black_box(evaluate_collection(black_box(&view), &scope, &scope, 1)));
            },
        );
    }

    group.bench_function("self_reference_unbounded", |b| {
        let doc = json!({"a": ["~.a"]});
        let scope = Scope::root(&doc);
        b.iter(|| black_box(evaluate_collection(&json!("~.a"), &scope, &scope, -1)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_update_flat,
    bench_store_update_noop,
    bench_apply_update_nested,
    bench_list_modes,
    bench_evaluate_collection,
);

criterion_main!(benches);
