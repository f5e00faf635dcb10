//! Shared utilities for driving the middleware against an in-memory
//! span exporter.

#![allow(dead_code)]

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::{Config, Tracer, TracerProvider};
use opentelemetry_sdk::Resource;

/// Provider wired to an in-memory exporter; spans export synchronously
/// on end, so assertions need no flush.
pub fn in_memory_provider() -> (TracerProvider, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider, exporter)
}

/// Like [`in_memory_provider`], with a `service.name` resource attached.
pub fn provider_with_service_name(name: &str) -> (TracerProvider, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .with_config(Config::default().with_resource(Resource::new([KeyValue::new(
            "service.name",
            name.to_string(),
        )])))
        .build();
    (provider, exporter)
}

/// A tracer plus the exporter its spans land in.
///
/// The provider must stay alive until the assertions are done: dropping
/// the last provider clone shuts the pipeline down, and the in-memory
/// exporter clears its collected spans on shutdown.
pub fn in_memory_tracer() -> (TracerProvider, Tracer, InMemorySpanExporter) {
    let (provider, exporter) = in_memory_provider();
    let tracer = provider.tracer("test");
    (provider, tracer, exporter)
}

/// Look up a span attribute by key.
pub fn attr(span: &SpanData, key: &str) -> Option<Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}
