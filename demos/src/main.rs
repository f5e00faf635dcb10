//! End-to-end demo server.
//!
//! Wires the full chain: OTLP telemetry init, request-id generation and
//! propagation, the tracing middleware, and graceful shutdown with a
//! bounded span drain. Point it at a local collector (Jaeger all-in-one
//! or the OTel collector) and watch one span per request arrive.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracekit::{ExporterProtocol, Telemetry, TelemetryConfig};

#[derive(Parser)]
#[command(name = "trace-server")]
#[command(about = "Demo HTTP server instrumented with tracekit", long_about = None)]
struct Cli {
    /// Logical service name reported on every span.
    #[arg(long, default_value = "tracekit-demo")]
    service_name: String,

    /// Collector endpoint (4317 for gRPC, 4318 for HTTP).
    #[arg(long, default_value = "http://localhost:4317")]
    endpoint: String,

    /// Exporter transport: "grpc" or "http/protobuf".
    #[arg(long, default_value = "grpc")]
    protocol: String,

    /// Address to serve on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Seconds to wait for buffered spans to drain at shutdown.
    #[arg(long, default_value_t = 5)]
    drain_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let protocol: ExporterProtocol = cli.protocol.parse()?;
    let config = TelemetryConfig::new(cli.service_name.clone(), cli.endpoint.clone())
        .with_protocol(protocol);
    let telemetry = Telemetry::init(config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trace_server=debug,tracekit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry.tracing_layer())
        .init();

    // Logs emitted inside init predate the subscriber, so restate the
    // telemetry wiring now that output is visible.
    tracing::info!(
        service_name = %cli.service_name,
        endpoint = %cli.endpoint,
        protocol = ?protocol,
        "telemetry initialized"
    );

    let app = Router::new()
        .route("/", get(|| async { "hello from tracekit" }))
        .route(
            "/orders/{id}",
            get(|Path(id): Path<u64>| async move {
                if id == 42 {
                    (StatusCode::NOT_FOUND, "order 42 is never found")
                } else {
                    (StatusCode::OK, "order located")
                }
            }),
        )
        // Outer layers run first: assign an ID, trace, echo the ID back.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(telemetry.trace_layer())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    tracing::info!(address = %cli.listen, "demo server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    })
    .await?;

    telemetry
        .shutdown(Duration::from_secs(cli.drain_secs))
        .await?;
    tracing::info!("drain complete");

    Ok(())
}
