//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use guard_types::dto::{ContactReceipt, ContactRequest, CsrfTokenResponse};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
async fn health() {}

/// Get the CSRF token for the current session
///
/// Starts a session (`sid` cookie) when the request carries none. Repeated
/// calls return the same token until it expires.
#[utoipa::path(
    get,
    path = "/api/csrf-token",
    tag = "csrf",
    responses(
        (status = 200, description = "Token for embedding into forms", body = CsrfTokenResponse),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn csrf_token() {}

/// Replace the CSRF token of the current session
#[utoipa::path(
    post,
    path = "/api/csrf-token/rotate",
    tag = "csrf",
    security(("csrf_token" = [])),
    responses(
        (status = 200, description = "New token; the previous one is no longer accepted", body = CsrfTokenResponse),
        (status = 403, description = "Missing or invalid CSRF token"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn rotate_csrf_token() {}

/// Submit the contact form
///
/// Accepts JSON or `application/x-www-form-urlencoded`. The token may be sent
/// in the `x-csrf-token` header or the `_csrf` field.
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "contact",
    request_body = ContactRequest,
    security(("csrf_token" = [])),
    responses(
        (status = 202, description = "Submission accepted", body = ContactReceipt),
        (status = 400, description = "Invalid submission"),
        (status = 403, description = "Missing or invalid CSRF token"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
async fn submit_contact() {}

/// OpenAPI documentation for the form guard API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio Form Guard API",
        version = "1.0.0",
        description = "Rate limiting and CSRF protection for portfolio form submissions.\n\n## CSRF\n\nFetch a token from `/api/csrf-token` and send it back with every non-GET request, either as the `x-csrf-token` header or the `_csrf` form field.\n\n## Rate limits\n\nResponses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset`. A 429 also carries `Retry-After`.",
        license(name = "MIT"),
    ),
    paths(
        health,
        csrf_token,
        rotate_csrf_token,
        submit_contact,
    ),
    components(
        schemas(
            CsrfTokenResponse,
            ContactRequest,
            ContactReceipt,
        )
    ),

    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "csrf", description = "CSRF token issuance"),
        (name = "contact", description = "Guarded form submissions"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for the CSRF header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "csrf_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-csrf-token"))),
            );
        }
    }
}
