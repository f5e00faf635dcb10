//! Span attribute keys recorded by the HTTP trace middleware.
//!
//! Keys live here as `const` values to avoid typos and keep the wire
//! contract with dashboards and alert queries in one place.

/// HTTP method of the traced request ("GET", "POST", ...).
pub const HTTP_METHOD: &str = "http.method";

/// Request path, without the query string.
pub const HTTP_TARGET: &str = "http.target";

/// Correlation ID assigned to the request, empty when none was present.
pub const HTTP_REQUEST_ID: &str = "http.request_id";

/// Remote peer address, recorded when the connection info is available.
pub const HTTP_CLIENT_IP: &str = "http.client_ip";

/// Response status code, recorded once the handler produced a response.
pub const HTTP_STATUS_CODE: &str = "http.status_code";

/// Wall-clock handler duration in whole milliseconds.
pub const HTTP_DURATION_MS: &str = "http.duration_ms";

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";
