//! CSRF validation middleware.
//!
//! Safe methods pass straight through. Everything else must present the
//! session's token in the `x-csrf-token` header or in the `_csrf` field of a
//! JSON or urlencoded body.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde::Deserialize;

use guard_types::{AppError, CSRF_HEADER, Clock, CsrfSessionStore, is_safe_method};

use super::handlers::{ApiError, AppState};
use super::session::session_id;

/// Largest body buffered while looking for the `_csrf` field.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct CsrfField {
    #[serde(rename = "_csrf")]
    csrf: Option<String>,
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Pulls `_csrf` out of a buffered body, if the content type is one we read.
fn body_token(headers: &HeaderMap, bytes: &Bytes) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let field = match mime.as_str() {
        "application/json" => serde_json::from_slice::<CsrfField>(bytes).ok()?,
        "application/x-www-form-urlencoded" => {
            serde_urlencoded::from_bytes::<CsrfField>(bytes).ok()?
        }
        _ => return None,
    };

    field.csrf.filter(|v| !v.is_empty())
}

/// True when buffering stopped because the body exceeded the limit.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

/// Buffers the body, reads the token from it, and rebuilds the request.
async fn token_from_body(
    request: Request<Body>,
) -> Result<(Option<String>, Request<Body>), AppError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|err| {
            if is_length_limit(&err) {
                AppError::PayloadTooLarge
            } else {
                AppError::BadRequest(format!("Failed to read request body: {}", err))
            }
        })?;

    let token = body_token(&parts.headers, &bytes);
    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

/// CSRF middleware.
pub async fn csrf_middleware<S: CsrfSessionStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    if is_safe_method(method.as_str()) {
        return next.run(request).await;
    }

    let session = session_id(request.headers());
    let path = request.uri().path().to_owned();

    let (token, request) = match header_token(request.headers()) {
        Some(token) => (Some(token), request),
        None => match token_from_body(request).await {
            Ok(found) => found,
            Err(err) => return ApiError(err).into_response(),
        },
    };

    match state
        .service
        .verify_csrf(method.as_str(), session.as_ref(), token.as_deref())
    {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::warn!(
                method = %method,
                path = %path,
                has_session = session.is_some(),
                has_token = token.is_some(),
                "CSRF validation failed"
            );
            ApiError::from(AppError::from(rejection)).into_response()
        }
    }
}
