//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use guard_types::{AppError, Clock, ContactRequest, CsrfSessionStore, CsrfTokenResponse, SessionId};

use super::rate_limit::apply_quota_headers;
use super::session::{session_cookie, session_id};
use crate::GuardService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers and middleware.
pub struct AppState<S: CsrfSessionStore, C: Clock> {
    pub service: Arc<GuardService<S, C>>,
    /// Take the client identity from `X-Forwarded-For` instead of the socket.
    pub trust_proxy: bool,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::TooManyRequests {
                decision,
                message,
                status,
            } => {
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::TOO_MANY_REQUESTS);
                let body = serde_json::json!({
                    "error": message,
                    "code": status.as_u16(),
                    "retry_after_seconds": decision.retry_after_secs,
                });
                let mut response = (status, Json(body)).into_response();
                apply_quota_headers(response.headers_mut(), decision);
                return response;
            }
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.0.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Issues the CSRF token for the caller's session, starting a session if needed.
#[tracing::instrument(skip_all)]
pub async fn csrf_token<S: CsrfSessionStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
) -> Response {
    let (session, started) = match session_id(&headers) {
        Some(session) => (session, false),
        None => (SessionId::generate(), true),
    };

    let issued = state.service.issue_token(&session);
    let body = Json(CsrfTokenResponse::new(
        issued.token.into_inner(),
        issued.expires_at,
    ));

    if started {
        tracing::debug!("started new session");
        ([(header::SET_COOKIE, session_cookie(&session))], body).into_response()
    } else {
        body.into_response()
    }
}

/// Replaces the session's CSRF token. The request itself must carry the current one.
#[tracing::instrument(skip_all)]
pub async fn rotate_csrf_token<S: CsrfSessionStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_id(&headers)
        .ok_or_else(|| AppError::Forbidden("Invalid CSRF token".into()))?;

    let issued = state.service.rotate_token(&session);
    Ok(Json(CsrfTokenResponse::new(
        issued.token.into_inner(),
        issued.expires_at,
    )))
}

/// Contact form body, accepted as JSON or as an urlencoded HTML form.
pub struct ContactPayload(pub ContactRequest);

impl<St: Send + Sync> FromRequest<St> for ContactPayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(contact) = Form::<ContactRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(contact))
        } else {
            let Json(contact) = Json::<ContactRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(contact))
        }
    }
}

/// Accept a contact form submission.
#[tracing::instrument(skip_all)]
pub async fn submit_contact<S: CsrfSessionStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
    ContactPayload(req): ContactPayload,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.service.submit_contact(req)?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}
