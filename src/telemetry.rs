//! Tracer provider lifecycle.
//!
//! # Responsibilities
//! - Build the export pipeline: OTLP exporter → batching processor →
//!   provider with the service-name resource
//! - Install the provider and the W3C trace-context propagator globally
//! - Drain buffered spans at shutdown under a bounded deadline
//!
//! # Design Decisions
//! - Ownership is explicit: [`Telemetry`] holds the provider and hands
//!   out tracers/layers; global registration is a startup side effect
//!   kept for third-party instrumentation that looks tracers up by name
//! - Re-initializing installs the newer provider (last-write-wins); the
//!   older handle stays valid for its own shutdown
//! - Provider shutdown is a blocking SDK call, so it runs on the
//!   blocking pool and is raced against the caller's deadline

use std::time::Duration;

use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Config as TraceConfig, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::config::TelemetryConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::exporter;
use crate::middleware::HttpTraceLayer;

/// Instrumentation scope name stamped on spans created by this crate.
const SCOPE_NAME: &str = "tracekit";

/// Owned handle to an installed tracer provider.
///
/// Created once at startup via [`Telemetry::init`]; dropped only through
/// [`Telemetry::shutdown`] during graceful termination. Dropping the
/// handle without calling `shutdown` risks losing the last batch of
/// buffered spans.
#[derive(Debug)]
pub struct Telemetry {
    provider: TracerProvider,
    tracer: Tracer,
}

impl Telemetry {
    /// Build and install the process-wide tracer provider.
    ///
    /// Validates `config`, constructs the OTLP exporter and batching
    /// processor, attaches the `service.name` resource, then registers
    /// the provider and the W3C propagator globally. Any failure is
    /// fatal: nothing is half-installed and the caller must not
    /// continue as if tracing were configured.
    ///
    /// Must run inside a tokio runtime; the batch processor spawns its
    /// export task on it.
    pub fn init(config: TelemetryConfig) -> TelemetryResult<Self> {
        config.validate().map_err(TelemetryError::InvalidConfig)?;

        let exporter = exporter::build_exporter(&config)?;
        let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio)
            .with_batch_config(config.batch.to_sdk())
            .build();
        let resource = Resource::new([KeyValue::new(SERVICE_NAME, config.service_name.clone())]);
        let provider = TracerProvider::builder()
            .with_span_processor(processor)
            .with_config(TraceConfig::default().with_resource(resource))
            .build();

        tracing::info!(
            service_name = %config.service_name,
            endpoint = %config.endpoint,
            protocol = ?config.protocol,
            "telemetry initialized"
        );

        Ok(Self::from_provider(provider))
    }

    /// Install an already-built provider and take ownership of it.
    ///
    /// Used by `init` and by tests that wire an in-memory exporter; also
    /// the escape hatch for applications with a custom pipeline.
    /// Registers the provider and the W3C trace-context propagator
    /// globally, replacing whatever was installed before.
    pub fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(SCOPE_NAME);
        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());
        Self { provider, tracer }
    }

    /// A tracer from this provider, for manual instrumentation.
    pub fn tracer(&self) -> Tracer {
        self.tracer.clone()
    }

    /// A request-tracing middleware layer bound to this provider.
    pub fn trace_layer(&self) -> HttpTraceLayer {
        HttpTraceLayer::new(self.tracer.clone())
    }

    /// A `tracing-opentelemetry` subscriber layer bridging `tracing`
    /// spans into this provider.
    pub fn tracing_layer<S>(&self) -> OpenTelemetryLayer<S, Tracer>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    {
        tracing_opentelemetry::layer().with_tracer(self.tracer.clone())
    }

    /// Drain buffered spans and tear the provider down.
    ///
    /// Returns [`TelemetryError::ShutdownTimeout`] when `timeout`
    /// elapses before the flush completes; a zero timeout fails
    /// immediately the same way. A flush that runs but fails is
    /// reported as [`TelemetryError::Flush`]. Neither outcome affects
    /// spans already exported.
    pub async fn shutdown(self, timeout: Duration) -> TelemetryResult<()> {
        if timeout.is_zero() {
            return Err(TelemetryError::ShutdownTimeout { waited: timeout });
        }

        let provider = self.provider;
        let flush = tokio::task::spawn_blocking(move || provider.shutdown());
        match tokio::time::timeout(timeout, flush).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!("telemetry shut down, buffered spans flushed");
                Ok(())
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!(error = %err, "span flush failed during shutdown");
                Err(TelemetryError::Flush(err))
            }
            Ok(Err(join_err)) => Err(TelemetryError::Flush(TraceError::Other(Box::new(
                join_err,
            )))),
            Err(_) => {
                tracing::warn!(waited = ?timeout, "telemetry shutdown timed out, dropping buffered spans");
                Err(TelemetryError::ShutdownTimeout { waited: timeout })
            }
        }
    }
}
