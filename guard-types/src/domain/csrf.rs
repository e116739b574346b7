//! CSRF session types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Methods that never carry a state change and skip CSRF checks.
pub const SAFE_METHODS: [&str; 4] = ["GET", "HEAD", "OPTIONS", "TRACE"];

pub fn is_safe_method(method: &str) -> bool {
    SAFE_METHODS
        .iter()
        .any(|safe| safe.eq_ignore_ascii_case(method))
}

/// Opaque identifier correlating a browser session with its CSRF secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random session identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts only ids in the shape [`SessionId::generate`] produces.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// A CSRF secret as embedded into forms. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(***)")
    }
}

/// The live secret bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfSession {
    pub secret: CsrfToken,
    pub issued_at: DateTime<Utc>,
}

impl CsrfSession {
    pub fn new(secret: CsrfToken, issued_at: DateTime<Utc>) -> Self {
        Self { secret, issued_at }
    }

    pub fn expires_at(&self, ttl: TimeDelta) -> DateTime<Utc> {
        self.issued_at + ttl
    }

    /// Live until `issued_at + ttl`, exclusive.
    pub fn is_live(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now < self.expires_at(ttl)
    }
}
