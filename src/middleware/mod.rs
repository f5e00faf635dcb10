//! Request tracing middleware.
//!
//! # Responsibilities
//! - Start one span per inbound HTTP request, named `"<METHOD> <path>"`
//! - Record method, path, request ID, and client address before the
//!   inner service runs; status code and duration after it resolves
//! - Expose the span's context to downstream services via request
//!   extensions
//!
//! # Design Decisions
//! - The tracer is injected (from [`Telemetry`](crate::Telemetry)), not
//!   looked up globally per request
//! - Parent extraction goes through the globally registered propagator,
//!   so requests carrying `traceparent` headers nest under the caller
//! - Span completion is RAII: the response future owns the span's
//!   context, and the SDK span ends on drop, so cancellation and early
//!   drops still produce exactly one ended span
//! - Instrumentation is best-effort and pass-through: the inner
//!   service's response and error reach the caller untouched

pub mod attributes;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::extract::ConnectInfo;
use http::{Request, Response};
use opentelemetry::trace::{Span as _, SpanKind, TraceContextExt, Tracer as _};
use opentelemetry::{global, Context as OtelContext, KeyValue};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::trace::Tracer;
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tower_http::request_id::RequestId;

/// `tower::Layer` that wraps services in [`HttpTrace`].
///
/// Obtain one from [`Telemetry::trace_layer`](crate::Telemetry::trace_layer)
/// or build it directly from any SDK tracer.
#[derive(Debug, Clone)]
pub struct HttpTraceLayer {
    tracer: Tracer,
}

impl HttpTraceLayer {
    pub fn new(tracer: Tracer) -> Self {
        Self { tracer }
    }
}

impl<S> Layer<S> for HttpTraceLayer {
    type Service = HttpTrace<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpTrace {
            inner,
            tracer: self.tracer.clone(),
        }
    }
}

/// Middleware service that emits one span per request.
#[derive(Debug, Clone)]
pub struct HttpTrace<S> {
    inner: S,
    tracer: Tracer,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HttpTrace<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let started = Instant::now();

        // Nest under an incoming traceparent when one is present.
        let parent_cx =
            global::get_text_map_propagator(|prop| prop.extract(&HeaderExtractor(req.headers())));

        let mut span = self
            .tracer
            .span_builder(span_name(&req))
            .with_kind(SpanKind::Server)
            .start_with_context(&self.tracer, &parent_cx);

        span.set_attribute(KeyValue::new(
            attributes::HTTP_METHOD,
            req.method().to_string(),
        ));
        span.set_attribute(KeyValue::new(
            attributes::HTTP_TARGET,
            req.uri().path().to_string(),
        ));
        span.set_attribute(KeyValue::new(attributes::HTTP_REQUEST_ID, request_id(&req)));
        if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            span.set_attribute(KeyValue::new(attributes::HTTP_CLIENT_IP, addr.to_string()));
        }

        // Downstream services parent further spans on this context.
        let cx = parent_cx.with_span(span);
        req.extensions_mut().insert(cx.clone());

        ResponseFuture {
            inner: self.inner.call(req),
            span_cx: Some(cx),
            started,
        }
    }
}

/// Span name per the `"<METHOD> <path>"` convention: query string
/// stripped, path otherwise verbatim.
fn span_name<B>(req: &Request<B>) -> String {
    format!("{} {}", req.method(), req.uri().path())
}

/// Correlation ID assigned upstream: the `tower-http` request-id
/// extension when set, otherwise the `x-request-id` header, otherwise
/// empty.
fn request_id<B>(req: &Request<B>) -> String {
    if let Some(id) = req.extensions().get::<RequestId>() {
        return id
            .header_value()
            .to_str()
            .map(str::to_owned)
            .unwrap_or_default();
    }
    req.headers()
        .get(attributes::X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

pin_project! {
    /// Response future for [`HttpTrace`].
    ///
    /// Owns the span's context. On completion it records the status and
    /// duration and ends the span explicitly; when dropped before
    /// completion (client disconnect, cancellation) the SDK span ends
    /// through drop with whatever was recorded by then.
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        span_cx: Option<OtelContext>,
        started: Instant,
    }
}

impl<F, ResBody, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));

        if let Some(span_cx) = this.span_cx.take() {
            let span = span_cx.span();
            if let Ok(response) = &result {
                span.set_attribute(KeyValue::new(
                    attributes::HTTP_STATUS_CODE,
                    i64::from(response.status().as_u16()),
                ));
            }
            span.set_attribute(KeyValue::new(
                attributes::HTTP_DURATION_MS,
                this.started.elapsed().as_millis() as f64,
            ));
            span.end();
        }

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_span_name_strips_query_string() {
        let req = Request::builder()
            .method("GET")
            .uri("/orders/42?verbose=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(span_name(&req), "GET /orders/42");
    }

    #[test]
    fn test_span_names_distinguish_path_parameters() {
        let a = Request::builder()
            .uri("/orders/42")
            .body(Body::empty())
            .unwrap();
        let b = Request::builder()
            .uri("/orders/43")
            .body(Body::empty())
            .unwrap();
        assert_ne!(span_name(&a), span_name(&b));
    }

    #[test]
    fn test_request_id_prefers_extension_over_header() {
        let mut req = Request::builder()
            .header("x-request-id", "from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&req), "from-header");

        req.extensions_mut().insert(RequestId::new(
            http::HeaderValue::from_static("from-extension"),
        ));
        assert_eq!(request_id(&req), "from-extension");
    }

    #[test]
    fn test_request_id_empty_when_absent() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(request_id(&req), "");
    }
}
