//! Benchmarks for the per-request rewrite path.
//!
//! Run with: cargo bench --bench request_rewrite

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use openai_bridge::core::{filter_headers, hash_identity_field, hash_user_id};
use serde_json::json;

fn create_test_headers(count: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
    headers.insert("cookie", HeaderValue::from_static("session=abc"));
    for i in 0..count {
        let prefix = if i % 2 == 0 { "x-custom" } else { "accept-ext" };
        let name = HeaderName::from_bytes(format!("{}-{}", prefix, i).as_bytes()).unwrap();
        headers.insert(name, HeaderValue::from_static("value"));
    }
    headers
}

fn bench_filter_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_headers");

    for header_count in [4, 16, 64].iter() {
        let headers = create_test_headers(*header_count);

        group.throughput(Throughput::Elements(*header_count as u64));
        group.bench_function(format!("{}_headers", header_count), |b| {
            b.iter(|| black_box(filter_headers(black_box(&headers))));
        });
    }

    group.finish();
}

fn bench_hash_user_id(c: &mut Criterion) {
    c.bench_function("hash_user_id", |b| {
        b.iter(|| black_box(hash_user_id(black_box("salt"), black_box("alice@example.com"))));
    });
}

fn bench_identity_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity_rewrite");

    for message_count in [1, 10, 50].iter() {
        let messages: Vec<_> = (0..*message_count)
            .map(|i| json!({"role": "user", "content": format!("Message content {}", i)}))
            .collect();
        let body = json!({"model": "gpt-4", "messages": messages, "user": "alice@example.com"});
        let raw = serde_json::to_vec(&body).unwrap();

        group.bench_function(format!("{}_messages", message_count), |b| {
            b.iter(|| {
                let mut value: serde_json::Value = serde_json::from_slice(black_box(&raw)).unwrap();
                hash_identity_field(&mut value, "salt").unwrap();
                black_box(serde_json::to_vec(&value).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_headers,
    bench_hash_user_id,
    bench_identity_rewrite
);
criterion_main!(benches);
