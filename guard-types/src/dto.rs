//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name of the form field carrying the CSRF token.
pub const CSRF_FORM_FIELD: &str = "_csrf";

/// Name of the request header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

// ─────────────────────────────────────────────────────────────────────────────
// CSRF DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Token to embed into outgoing forms.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CsrfTokenResponse {
    /// The session's current CSRF secret
    #[schema(example = "9f2c...e41a")]
    pub token: String,
    /// Form field the token should be submitted in
    #[schema(example = "_csrf")]
    pub field: String,
    /// Header the token may be submitted in instead
    #[schema(example = "x-csrf-token")]
    pub header: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl CsrfTokenResponse {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            field: CSRF_FORM_FIELD.to_string(),
            header: CSRF_HEADER.to_string(),
            expires_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contact form DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum accepted length of a contact message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Contact form submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Hi! I'd like to talk about a project.")]
    pub message: String,
}

impl ContactRequest {
    /// Checks the submission, returning a user-facing reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name cannot be empty".into());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("A valid email address is required".into());
        }
        if self.message.trim().is_empty() {
            return Err("Message cannot be empty".into());
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(format!(
                "Message cannot be longer than {} characters",
                MAX_MESSAGE_CHARS
            ));
        }
        Ok(())
    }
}

/// Acknowledgement for an accepted contact submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactReceipt {
    #[schema(example = "received")]
    pub status: String,
    pub received_at: DateTime<Utc>,
}
