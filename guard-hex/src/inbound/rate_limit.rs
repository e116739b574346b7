//! Rate limiting middleware.
//!
//! Runs before CSRF validation. Every request counts against the site-wide
//! limit; form submissions additionally count against the form limit, whose
//! quota is the one reported in the headers. Denied requests never reach
//! the CSRF check.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};

use guard_types::{AppError, ClientIdentity, Clock, CsrfSessionStore, Decision, is_safe_method};

use super::handlers::{ApiError, AppState};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Routes that accept form submissions.
pub const FORM_PATHS: [&str; 1] = ["/api/contact"];

fn is_form_submission(request: &Request<Body>) -> bool {
    !is_safe_method(request.method().as_str()) && FORM_PATHS.contains(&request.uri().path())
}

/// Writes `X-RateLimit-*` headers, plus `Retry-After` on denials.
pub(crate) fn apply_quota_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(decision.reset_epoch_secs()),
    );
    if let Some(secs) = decision.retry_after_secs {
        headers.insert(RETRY_AFTER, HeaderValue::from(secs));
    }
}

/// Resolves the rate-limit key for a request.
///
/// With `trust_proxy` the first `X-Forwarded-For` entry wins; otherwise the
/// socket peer address is used. Falls back to the shared unknown bucket.
fn client_identity(request: &Request<Body>, trust_proxy: bool) -> ClientIdentity {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return ClientIdentity::new(addr);
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| ClientIdentity::from(addr.ip()))
        .unwrap_or_else(ClientIdentity::unknown)
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware<S: CsrfSessionStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Skip rate limiting for health endpoint
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let identity = client_identity(&request, state.trust_proxy);

    let outcome = match state.service.admit(&identity, request.method().as_str()) {
        Ok(_) if is_form_submission(&request) => state.service.admit_form(&identity).map(Some),
        other => other,
    };

    match outcome {
        Ok(None) => next.run(request).await,
        Ok(Some(decision)) => {
            let mut response = next.run(request).await;
            apply_quota_headers(response.headers_mut(), &decision);
            response
        }
        Err(rejection) => {
            tracing::warn!(
                identity = %identity,
                method = %request.method(),
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            ApiError::from(AppError::from(rejection)).into_response()
        }
    }
}
