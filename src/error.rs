//! Error definitions for telemetry setup and teardown.
//!
//! The middleware has no error channel of its own: instrumentation is
//! best-effort and never surfaces failures to the wrapped service. The
//! errors here cover the two fallible edges of the crate — startup
//! (fatal, abort initialization) and shutdown (reported to the caller,
//! already-exported spans unaffected).

use std::time::Duration;

use opentelemetry::trace::TraceError;
use thiserror::Error;

use crate::config::ValidationError;

/// Errors surfaced by [`Telemetry`](crate::Telemetry).
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration failed semantic validation. Carries every
    /// violation found, not just the first.
    #[error("invalid telemetry configuration ({} error(s)): {}", .0.len(), describe(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The span exporter could not be constructed. Fatal at startup.
    #[error("failed to build span exporter: {0}")]
    Exporter(#[from] TraceError),

    /// Shutdown did not drain buffered spans within the deadline.
    /// Spans still in the queue are dropped, not retried.
    #[error("tracer provider shutdown did not complete within {waited:?}")]
    ShutdownTimeout { waited: Duration },

    /// The final flush ran but the SDK reported a failure.
    #[error("span flush failed during shutdown: {0}")]
    Flush(TraceError),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
