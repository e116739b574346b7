//! # Form Guard Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Create the request gate (rate limiter + CSRF guard)
//! - Start the background sweeper
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guard_hex::{GuardService, Sweeper, inbound::HttpServer};

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    use opentelemetry_otlp::WithExportConfig;

    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("form-guard"), provider))
}

async fn shutdown_signal(tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    let _ = tx.send(());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize OpenTelemetry tracing when a collector is configured
    let otel = config
        .otlp_endpoint
        .as_deref()
        .map(init_tracer)
        .transpose()?;
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,guard_app=debug,guard_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    tracing::info!("Starting form guard on port {}", config.port);
    tracing::info!(
        limit = config.rate_limit.limit,
        window_ms = config.rate_limit.window_ms,
        scope = %config.rate_limit.scope,
        token_ttl_ms = config.csrf.token_ttl_ms,
        trust_proxy = config.trust_proxy,
        "Guard configuration"
    );

    // Create the request gate
    let service = Arc::new(
        GuardService::in_memory(config.rate_limit, config.csrf)?
            .with_form_limit(config.form_rate_limit)?,
    );
    tracing::info!(
        limit = service.form_limiter().limit(),
        window_secs = service.form_limiter().window().num_seconds(),
        "Form submission limit"
    );

    let (shutdown_tx, _) = broadcast::channel(1);

    // Background purge of expired state
    let sweeper = Sweeper::new(service.clone(), config.sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_tx.subscribe()));

    // Create and run the HTTP server
    let server = HttpServer::from_shared(service, config.trust_proxy);
    let addr = format!("0.0.0.0:{}", config.port);

    tokio::spawn(shutdown_signal(shutdown_tx.clone()));
    server.run(&addr, shutdown_tx.subscribe()).await?;

    // Server is down; make sure the sweeper stops too
    let _ = shutdown_tx.send(());
    let _ = sweeper_handle.await;

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }
    Ok(())
}
