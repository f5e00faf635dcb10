//! Telemetry configuration schema and validation.
//!
//! # Responsibilities
//! - Define the startup configuration (service name, collector endpoint,
//!   exporter protocol, batching knobs)
//! - Semantic validation (serde handles syntactic)
//! - Environment-variable construction (`OTEL_*` conventions)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: TelemetryConfig → Result<(), Vec<ValidationError>>
//! - Runs before any SDK object is constructed, so a rejected config
//!   leaves no half-installed tracing state behind

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable carrying the logical service name.
pub const ENV_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

/// Environment variable carrying the collector endpoint URL.
pub const ENV_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Environment variable selecting the exporter transport.
pub const ENV_PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";

/// Startup configuration for [`Telemetry::init`](crate::Telemetry::init).
///
/// Embeddable in application config files via serde, or built in code
/// with [`TelemetryConfig::new`] / [`TelemetryConfig::from_env`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Logical service name, attached as the `service.name` resource
    /// attribute on every span exported by this process.
    pub service_name: String,

    /// Collector endpoint as an absolute http(s) URL
    /// (e.g. "http://localhost:4317" for gRPC, ":4318" for HTTP-binary).
    pub endpoint: String,

    /// Exporter transport to the collector.
    pub protocol: ExporterProtocol,

    /// Per-export-request timeout in seconds.
    pub export_timeout_secs: u64,

    /// Batching span processor settings.
    pub batch: BatchConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown-service".to_string(),
            endpoint: "http://localhost:4317".to_string(),
            protocol: ExporterProtocol::Grpc,
            export_timeout_secs: 10,
            batch: BatchConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Plain-parameter constructor: service name and collector endpoint,
    /// everything else defaulted.
    pub fn new(service_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Select the exporter transport.
    pub fn with_protocol(mut self, protocol: ExporterProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Build a config from the standard `OTEL_*` environment variables,
    /// defaulting any that are unset.
    ///
    /// Fails only if `OTEL_EXPORTER_OTLP_PROTOCOL` is set to a value
    /// that names no known transport; all other problems are left for
    /// [`validate`](Self::validate) to report in aggregate.
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();
        if let Ok(name) = std::env::var(ENV_SERVICE_NAME) {
            config.service_name = name;
        }
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Ok(protocol) = std::env::var(ENV_PROTOCOL) {
            config.protocol = protocol.parse()?;
        }
        Ok(config)
    }

    /// Per-export-request timeout as a [`Duration`].
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }

    /// Validate the configuration, reporting every violation.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.service_name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName);
        }

        match Url::parse(&self.endpoint) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(ValidationError::InvalidEndpoint {
                    endpoint: self.endpoint.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            Ok(_) => {}
            Err(err) => {
                errors.push(ValidationError::InvalidEndpoint {
                    endpoint: self.endpoint.clone(),
                    reason: err.to_string(),
                });
            }
        }

        if self.export_timeout_secs == 0 {
            errors.push(ValidationError::ZeroExportTimeout);
        }

        if self.batch.max_queue_size == 0 {
            errors.push(ValidationError::ZeroBatchQueue);
        }

        if self.batch.max_export_batch_size > self.batch.max_queue_size {
            errors.push(ValidationError::BatchLargerThanQueue {
                batch: self.batch.max_export_batch_size,
                queue: self.batch.max_queue_size,
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Exporter transport to the collector.
///
/// Both variants feed the identical batching/export pipeline; the choice
/// is a configuration detail, not a structural fork. The conventional
/// collector ports are 4317 (gRPC) and 4318 (HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExporterProtocol {
    /// OTLP over gRPC (tonic).
    #[default]
    Grpc,
    /// OTLP protobuf over plain HTTP.
    HttpBinary,
}

impl FromStr for ExporterProtocol {
    type Err = ValidationError;

    /// Accepts the `OTEL_EXPORTER_OTLP_PROTOCOL` spellings ("grpc",
    /// "http/protobuf") plus this crate's serde spelling ("http-binary").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grpc" => Ok(Self::Grpc),
            "http/protobuf" | "http-binary" => Ok(Self::HttpBinary),
            other => Err(ValidationError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Batching span processor settings, mapped onto the SDK's batch config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum spans buffered before the processor starts dropping.
    pub max_queue_size: usize,

    /// Delay between scheduled exports, in milliseconds.
    pub scheduled_delay_ms: u64,

    /// Maximum spans shipped per export request.
    pub max_export_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        // SDK defaults, restated so they survive serde round-trips.
        Self {
            max_queue_size: 2048,
            scheduled_delay_ms: 5_000,
            max_export_batch_size: 512,
        }
    }
}

impl BatchConfig {
    pub(crate) fn to_sdk(&self) -> opentelemetry_sdk::trace::BatchConfig {
        opentelemetry_sdk::trace::BatchConfigBuilder::default()
            .with_max_queue_size(self.max_queue_size)
            .with_scheduled_delay(Duration::from_millis(self.scheduled_delay_ms))
            .with_max_export_batch_size(self.max_export_batch_size)
            .build()
    }
}

/// A single semantic problem found in a [`TelemetryConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Service name is empty or whitespace.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// Endpoint is not an absolute http(s) URL.
    #[error("collector endpoint '{endpoint}' is not a valid http(s) URL: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Export timeout of zero would fail every export immediately.
    #[error("export timeout must be greater than zero")]
    ZeroExportTimeout,

    /// A zero-capacity queue drops every span.
    #[error("batch max_queue_size must be greater than zero")]
    ZeroBatchQueue,

    /// Export batches cannot exceed the buffering queue.
    #[error("batch max_export_batch_size ({batch}) exceeds max_queue_size ({queue})")]
    BatchLargerThanQueue { batch: usize, queue: usize },

    /// Unrecognized transport name.
    #[error("unknown exporter protocol '{0}' (expected 'grpc' or 'http/protobuf')")]
    UnknownProtocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TelemetryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protocol, ExporterProtocol::Grpc);
        assert_eq!(config.batch.max_queue_size, 2048);
    }

    #[test]
    fn test_new_sets_name_and_endpoint() {
        let config = TelemetryConfig::new("orders-api", "http://collector:4317");
        assert_eq!(config.service_name, "orders-api");
        assert_eq!(config.endpoint, "http://collector:4317");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let config = TelemetryConfig::new("   ", "http://localhost:4317");
        let errors = config.validate().unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyServiceName));
    }

    #[test]
    fn test_garbage_endpoint_rejected() {
        let config = TelemetryConfig::new("svc", "not a url");
        let errors = config.validate().unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidEndpoint { .. }
        ));
    }

    #[test]
    fn test_relative_endpoint_rejected() {
        let config = TelemetryConfig::new("svc", "/v1/traces");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let config = TelemetryConfig::new("svc", "ftp://collector:4317");
        let errors = config.validate().unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidEndpoint { .. }
        ));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut config = TelemetryConfig::new("", "garbage");
        config.export_timeout_secs = 0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::EmptyServiceName));
        assert!(errors.contains(&ValidationError::ZeroExportTimeout));
    }

    #[test]
    fn test_batch_limits_checked() {
        let mut config = TelemetryConfig::default();
        config.batch.max_queue_size = 10;
        config.batch.max_export_batch_size = 100;
        let errors = config.validate().unwrap_err();
        assert_eq!(
            errors[0],
            ValidationError::BatchLargerThanQueue {
                batch: 100,
                queue: 10
            }
        );
    }

    #[test]
    fn test_protocol_parsing() {
        assert_eq!(
            "grpc".parse::<ExporterProtocol>().unwrap(),
            ExporterProtocol::Grpc
        );
        assert_eq!(
            "http/protobuf".parse::<ExporterProtocol>().unwrap(),
            ExporterProtocol::HttpBinary
        );
        assert_eq!(
            "HTTP-BINARY".parse::<ExporterProtocol>().unwrap(),
            ExporterProtocol::HttpBinary
        );
        assert!(matches!(
            "thrift".parse::<ExporterProtocol>(),
            Err(ValidationError::UnknownProtocol(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = TelemetryConfig::new("svc", "http://localhost:4318")
            .with_protocol(ExporterProtocol::HttpBinary);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("http-binary"));
        let back: TelemetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.protocol, ExporterProtocol::HttpBinary);
        assert_eq!(back.endpoint, "http://localhost:4318");
    }
}
