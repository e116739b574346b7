//! Request Gate Service
//!
//! Sequences the guards for a single request: the site-wide rate limit,
//! then the form limit on form submissions, then CSRF validation. Contains NO HTTP logic - the inbound adapter
//! extracts identity, session and token and hands them over.

use chrono::{DateTime, Utc};
use guard_core::{
    CsrfConfig, CsrfGuard, InMemorySessionStore, IssuedToken, RateLimitConfig, RateLimiter,
    SystemClock,
};
use guard_types::{
    AppError, ClientIdentity, Clock, ConfigError, ContactReceipt, ContactRequest,
    CsrfSessionStore, Decision, GuardRejection, SessionId, is_safe_method,
};

/// Counts of entries removed by one [`GuardService::sweep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rate_limit_entries: usize,
    pub csrf_sessions: usize,
}

/// The composite request gate.
///
/// Generic over the session store and the clock so tests can inject
/// isolated state and control time.
pub struct GuardService<S: CsrfSessionStore, C: Clock = SystemClock> {
    limiter: RateLimiter<C>,
    /// Tighter limit applied only to form submissions.
    form_limiter: RateLimiter<C>,
    csrf: CsrfGuard<S, C>,
    clock: C,
}

impl GuardService<InMemorySessionStore, SystemClock> {
    /// Builds a gate backed by the in-memory session store and the wall clock.
    pub fn in_memory(rate: RateLimitConfig, csrf: CsrfConfig) -> Result<Self, ConfigError> {
        Self::new(rate, csrf, InMemorySessionStore::new(), SystemClock)
    }
}

impl<S: CsrfSessionStore, C: Clock + Clone> GuardService<S, C> {
    /// Creates the gate. Invalid settings fail here, before any request is served.
    ///
    /// Form submissions get [`RateLimitConfig::form`] until replaced with
    /// [`GuardService::with_form_limit`].
    pub fn new(
        rate: RateLimitConfig,
        csrf: CsrfConfig,
        store: S,
        clock: C,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            limiter: RateLimiter::new(rate, clock.clone())?,
            form_limiter: RateLimiter::new(RateLimitConfig::form(), clock.clone())?,
            csrf: CsrfGuard::new(csrf, store, clock.clone())?,
            clock,
        })
    }

    /// Replaces the limit applied to form submissions.
    pub fn with_form_limit(mut self, form: RateLimitConfig) -> Result<Self, ConfigError> {
        self.form_limiter = RateLimiter::new(form, self.clock.clone())?;
        Ok(self)
    }
}

impl<S: CsrfSessionStore, C: Clock> GuardService<S, C> {
    // ─────────────────────────────────────────────────────────────────────────────
    // Gate
    // ─────────────────────────────────────────────────────────────────────────────

    /// Rate-limit step.
    ///
    /// Returns `Ok(None)` when the configured scope does not cover `method`,
    /// `Ok(Some(decision))` when the request is admitted.
    pub fn admit(
        &self,
        identity: &ClientIdentity,
        method: &str,
    ) -> Result<Option<Decision>, GuardRejection> {
        if !self.limiter.scope().applies_to(method) {
            return Ok(None);
        }

        Self::check(&self.limiter, identity).map(Some)
    }

    /// Form-submission step, counted separately from the site-wide limit.
    pub fn admit_form(&self, identity: &ClientIdentity) -> Result<Decision, GuardRejection> {
        Self::check(&self.form_limiter, identity)
    }

    fn check(limiter: &RateLimiter<C>, identity: &ClientIdentity) -> Result<Decision, GuardRejection> {
        let decision = limiter.check_limit(identity);
        if decision.allowed {
            Ok(decision)
        } else {
            Err(GuardRejection::QuotaExceeded {
                decision,
                message: limiter.message().to_string(),
                status: limiter.status_code(),
            })
        }
    }

    /// CSRF step. Safe methods pass without a token.
    pub fn verify_csrf(
        &self,
        method: &str,
        session: Option<&SessionId>,
        submitted: Option<&str>,
    ) -> Result<(), GuardRejection> {
        if is_safe_method(method) {
            return Ok(());
        }

        match (session, submitted) {
            (Some(session), Some(token)) if self.csrf.validate_token(session, token) => Ok(()),
            _ => Err(GuardRejection::InvalidCsrfToken),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────────────────────

    /// Token for a freshly rendered form.
    pub fn issue_token(&self, session: &SessionId) -> IssuedToken {
        self.csrf.issue_token(session)
    }

    pub fn rotate_token(&self, session: &SessionId) -> IssuedToken {
        self.csrf.rotate_token(session)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────────

    /// Purges expired rate-limit entries and CSRF secrets.
    pub fn sweep(&self) -> SweepReport {
        SweepReport {
            rate_limit_entries: self.limiter.purge_expired() + self.form_limiter.purge_expired(),
            csrf_sessions: self.csrf.purge_expired(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }

    pub fn form_limiter(&self) -> &RateLimiter<C> {
        &self.form_limiter
    }

    pub fn csrf(&self) -> &CsrfGuard<S, C> {
        &self.csrf
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Form submissions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Accepts a contact form submission that already passed the gate.
    pub fn submit_contact(&self, req: ContactRequest) -> Result<ContactReceipt, AppError> {
        req.validate().map_err(AppError::BadRequest)?;

        let received_at: DateTime<Utc> = self.clock.now();
        tracing::info!(
            name = %req.name.trim(),
            message_chars = req.message.chars().count(),
            "contact form received"
        );

        Ok(ContactReceipt {
            status: "received".into(),
            received_at,
        })
    }
}
