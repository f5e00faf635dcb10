//! OTLP span exporter construction.
//!
//! The transport seam: maps [`ExporterProtocol`] onto the SDK's exporter
//! builders. Both variants produce the same [`SpanExporter`] type, so the
//! provider pipeline in [`telemetry`](crate::telemetry) is identical
//! regardless of transport.

use opentelemetry::trace::TraceError;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};

use crate::config::{ExporterProtocol, TelemetryConfig};

/// Build the span exporter named by `config.protocol`.
///
/// Construction is lazy with respect to the network: no connection is
/// attempted here, so an unreachable collector surfaces later as export
/// failures, not as an `init` error. The gRPC variant still binds its
/// lazy channel to the ambient tokio runtime, so it must be built
/// inside one (as [`Telemetry::init`](crate::Telemetry::init) already
/// requires). Malformed endpoints are caught by config validation
/// before this runs.
pub fn build_exporter(config: &TelemetryConfig) -> Result<SpanExporter, TraceError> {
    match config.protocol {
        ExporterProtocol::Grpc => opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(config.endpoint.as_str())
            .with_timeout(config.export_timeout())
            .build_span_exporter(),
        ExporterProtocol::HttpBinary => opentelemetry_otlp::new_exporter()
            .http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(config.endpoint.as_str())
            .with_timeout(config.export_timeout())
            .build_span_exporter(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a runtime: tonic binds its lazy channel even without connecting.
    #[tokio::test]
    async fn test_grpc_exporter_builds_without_collector() {
        let config = TelemetryConfig::new("svc", "http://127.0.0.1:4317");
        assert!(build_exporter(&config).is_ok());
    }

    #[test]
    fn test_http_exporter_builds_without_collector() {
        let config = TelemetryConfig::new("svc", "http://127.0.0.1:4318/v1/traces")
            .with_protocol(ExporterProtocol::HttpBinary);
        assert!(build_exporter(&config).is_ok());
    }
}
