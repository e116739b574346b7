//! HTTP Server configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use guard_core::SystemClock;
use guard_types::{Clock, CsrfSessionStore};

use super::csrf::csrf_middleware;
use super::handlers::{self, AppState};
use super::rate_limit::rate_limit_middleware;
use crate::GuardService;

/// HTTP Server for the form guard.
pub struct HttpServer<S: CsrfSessionStore, C: Clock = SystemClock> {
    state: Arc<AppState<S, C>>,
}

impl<S: CsrfSessionStore, C: Clock> HttpServer<S, C> {
    /// Creates a new HTTP server around the given gate.
    pub fn new(service: GuardService<S, C>) -> Self {
        Self::from_shared(Arc::new(service), false)
    }

    /// Creates a server sharing the gate with other tasks (e.g. the sweeper).
    pub fn from_shared(service: Arc<GuardService<S, C>>, trust_proxy: bool) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                trust_proxy,
            }),
        }
    }

    /// Key rate limits on `X-Forwarded-For` (only behind a trusted proxy).
    pub fn with_trust_proxy(service: GuardService<S, C>) -> Self {
        Self::from_shared(Arc::new(service), true)
    }

    /// Builds the Axum router with all routes.
    ///
    /// Layer order (outermost first): trace, rate limit, CSRF, handler.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route("/api/csrf-token", get(handlers::csrf_token::<S, C>))
            .route(
                "/api/csrf-token/rotate",
                post(handlers::rotate_csrf_token::<S, C>),
            )
            .route("/api/contact", post(handlers::submit_contact::<S, C>))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                csrf_middleware::<S, C>,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                rate_limit_middleware::<S, C>,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address until `shutdown` fires.
    pub async fn run(self, addr: &str, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

        Ok(())
    }
}
