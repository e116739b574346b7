//! Per-session CSRF secrets.
//!
//! Issuing and validating are separate operations: `validate_token` only
//! reads. A stale or missing secret makes validation fail, and the caller
//! gets a fresh one by calling `issue_token` when it renders the next form.

use chrono::{DateTime, TimeDelta, Utc};
use guard_types::{Clock, ConfigError, CsrfSession, CsrfSessionStore, CsrfToken, SessionId};

use crate::clock::SystemClock;
use crate::rate_limiter::millis_to_delta;
use crate::security::{generate_secret, tokens_match};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrfConfig {
    /// How long an issued secret stays valid, in milliseconds.
    pub token_ttl_ms: u64,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_ttl_ms: DEFAULT_TOKEN_TTL_MS,
        }
    }
}

impl CsrfConfig {
    pub fn validate(&self) -> Result<TimeDelta, ConfigError> {
        if self.token_ttl_ms == 0 {
            return Err(ConfigError::ZeroTokenTtl);
        }
        millis_to_delta(self.token_ttl_ms)
    }
}

/// A token handed out for embedding into a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: CsrfToken,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks CSRF secrets bound to sessions.
pub struct CsrfGuard<S: CsrfSessionStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    ttl: TimeDelta,
}

impl<S: CsrfSessionStore, C: Clock> CsrfGuard<S, C> {
    pub fn new(config: CsrfConfig, store: S, clock: C) -> Result<Self, ConfigError> {
        let ttl = config.validate()?;
        Ok(Self { store, clock, ttl })
    }

    /// Returns the session's live secret, creating one if there is none or
    /// the stored one has expired.
    pub fn issue_token(&self, session: &SessionId) -> IssuedToken {
        let now = self.clock.now();
        let ttl = self.ttl;
        let record = self.store.load_or_replace(
            session.clone(),
            &|existing| existing.is_live(now, ttl),
            &|| CsrfSession::new(generate_secret(), now),
        );
        self.issued(record)
    }

    /// Replaces the session's secret unconditionally. The previous token
    /// stops validating immediately.
    pub fn rotate_token(&self, session: &SessionId) -> IssuedToken {
        let record = CsrfSession::new(generate_secret(), self.clock.now());
        self.store.save(session.clone(), record.clone());
        tracing::debug!(session = %session, "rotated CSRF secret");
        self.issued(record)
    }

    /// True only if `submitted` equals the session's live secret.
    pub fn validate_token(&self, session: &SessionId, submitted: &str) -> bool {
        let Some(record) = self.store.load(session) else {
            return false;
        };
        if !record.is_live(self.clock.now(), self.ttl) {
            return false;
        }
        tokens_match(record.secret.as_bytes(), submitted.as_bytes())
    }

    /// Drops expired secrets. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.store.retain(&|record| record.is_live(now, ttl))
    }

    /// Number of sessions holding a secret.
    pub fn sessions(&self) -> usize {
        self.store.len()
    }

    fn issued(&self, record: CsrfSession) -> IssuedToken {
        IssuedToken {
            expires_at: record.expires_at(self.ttl),
            token: record.secret,
        }
    }
}
