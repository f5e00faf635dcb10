//! OpenTelemetry bootstrap and per-request tracing for tower HTTP services.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                  TRACEKIT                    │
//!                        │                                              │
//!   Startup ────────────▶│  config ──▶ telemetry ──▶ exporter           │
//!                        │              │   (owns provider, installs    │
//!                        │              │    global tracer + propagator)│
//!                        │              ▼                               │
//!   Inbound request ────▶│  middleware (HttpTraceLayer)                 │
//!                        │    one span per request:                     │
//!                        │    "<METHOD> <path>" + http.* attributes     │
//!                        │              │                               │
//!                        │              ▼                               │
//!   Shutdown ───────────▶│  Telemetry::shutdown(timeout) — drain spans  │
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! Two pieces, usable independently:
//!
//! - [`Telemetry`] builds an OTLP span exporter (gRPC or HTTP-binary),
//!   wraps it in the SDK's batching processor, attaches the service-name
//!   resource, and installs the result as the process-wide tracer
//!   provider. The handle owns the provider; `shutdown` drains buffered
//!   spans under a caller-supplied deadline.
//! - [`HttpTraceLayer`] wraps any `tower::Service` over `http` types and
//!   emits exactly one span per inbound request, annotated with method,
//!   path, request ID, client address, status code, and duration.

// Core subsystems
pub mod config;
pub mod exporter;
pub mod telemetry;

// Request instrumentation
pub mod middleware;

// Cross-cutting
pub mod error;

pub use config::{BatchConfig, ExporterProtocol, TelemetryConfig, ValidationError};
pub use error::TelemetryError;
pub use middleware::{HttpTrace, HttpTraceLayer};
pub use telemetry::Telemetry;
