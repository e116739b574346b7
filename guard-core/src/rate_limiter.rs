//! Per-client fixed-window rate limiting.
//!
//! Every identity gets a counter and a window start. The first request
//! opens the window; once `window` has elapsed since then the counter starts
//! over. Requests beyond `limit` inside one window are denied until it ends.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use guard_types::{ClientIdentity, Clock, ConfigError, Decision, RateLimitEntry, RateLimitScope};

use crate::clock::SystemClock;

/// Default window: 15 minutes.
pub const DEFAULT_WINDOW_MS: u64 = 15 * 60 * 1000;

/// Default requests per window for site-wide limiting.
pub const DEFAULT_LIMIT: u32 = 100;

/// Default requests per window for form submissions.
pub const DEFAULT_FORM_LIMIT: u32 = 5;

pub const DEFAULT_MESSAGE: &str = "Too many requests, please try again later.";

/// Default status for denied requests.
pub const DEFAULT_STATUS_CODE: u16 = 429;

/// Rate limiter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Max requests per window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Message returned to denied clients.
    pub message: String,
    /// HTTP status returned to denied clients.
    pub status_code: u16,
    pub scope: RateLimitScope,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window_ms: DEFAULT_WINDOW_MS,
            message: DEFAULT_MESSAGE.to_string(),
            status_code: DEFAULT_STATUS_CODE,
            scope: RateLimitScope::default(),
        }
    }
}

impl RateLimitConfig {
    pub fn new(limit: u32, window_ms: u64) -> Self {
        Self {
            limit,
            window_ms,
            ..Self::default()
        }
    }

    /// Settings for contact-form style endpoints: 5 requests per 15 minutes.
    pub fn form() -> Self {
        Self::new(DEFAULT_FORM_LIMIT, DEFAULT_WINDOW_MS)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_scope(mut self, scope: RateLimitScope) -> Self {
        self.scope = scope;
        self
    }

    /// Checks the settings and returns the window as a `TimeDelta`.
    pub fn validate(&self) -> Result<TimeDelta, ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        // Denials must read as client or server errors.
        if !(400..=599).contains(&self.status_code) {
            return Err(ConfigError::Invalid {
                key: "status_code".into(),
                value: self.status_code.to_string(),
            });
        }
        millis_to_delta(self.window_ms)
    }
}

pub(crate) fn millis_to_delta(ms: u64) -> Result<TimeDelta, ConfigError> {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .ok_or(ConfigError::DurationOutOfRange(ms))
}

/// In-memory rate limiter keyed by client identity.
///
/// The table is a `DashMap`, so the read-modify-write on one identity's
/// entry happens under that entry's shard lock and the limiter can be
/// shared across request tasks behind an `Arc`.
pub struct RateLimiter<C: Clock = SystemClock> {
    entries: DashMap<ClientIdentity, RateLimitEntry>,
    limit: u32,
    window: TimeDelta,
    message: String,
    status_code: u16,
    scope: RateLimitScope,
    clock: C,
}

impl<C: Clock> RateLimiter<C> {
    /// Creates a limiter, rejecting a zero limit or window up front.
    pub fn new(config: RateLimitConfig, clock: C) -> Result<Self, ConfigError> {
        let window = config.validate()?;
        Ok(Self {
            entries: DashMap::new(),
            limit: config.limit,
            window,
            message: config.message,
            status_code: config.status_code,
            scope: config.scope,
            clock,
        })
    }

    /// Counts a request from `identity` and decides whether to admit it.
    ///
    /// Expired entries of all identities are purged first. Denied requests
    /// are still counted.
    pub fn check_limit(&self, identity: &ClientIdentity) -> Decision {
        let now = self.clock.now();
        self.purge_expired_at(now);

        let mut entry = self
            .entries
            .entry(identity.clone())
            .or_insert_with(|| RateLimitEntry::new(now));

        if entry.is_expired(now, self.window) {
            entry.reset(now);
        }
        entry.count = entry.count.saturating_add(1);

        let reset = entry.window_end(self.window);
        if entry.count > self.limit {
            tracing::debug!(identity = %identity, count = entry.count, "rate limit exceeded");
            Decision::deny(self.limit, reset, now)
        } else {
            Decision::admit(self.limit, entry.count, reset)
        }
    }

    /// Removes entries whose window has ended. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(self.clock.now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let window = self.window;
        self.entries.retain(|_, entry| !entry.is_expired(now, window));
        before.saturating_sub(self.entries.len())
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn scope(&self) -> RateLimitScope {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::TimeZone;

    const WINDOW_MS: u64 = 900_000;

    fn limiter(limit: u32) -> (RateLimiter<MockClock>, MockClock) {
        let clock = MockClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let limiter = RateLimiter::new(RateLimitConfig::new(limit, WINDOW_MS), clock.clone())
            .expect("valid config");
        (limiter, clock)
    }

    #[test]
    fn test_rejects_zero_limit() {
        let result = RateLimiter::new(RateLimitConfig::new(0, WINDOW_MS), SystemClock);
        assert!(matches!(result, Err(ConfigError::ZeroLimit)));
    }

    #[test]
    fn test_rejects_non_error_status_code() {
        for status in [200, 302, 600] {
            let config = RateLimitConfig::new(5, WINDOW_MS).with_status_code(status);
            assert!(matches!(
                RateLimiter::new(config, SystemClock),
                Err(ConfigError::Invalid { .. })
            ));
        }

        let config = RateLimitConfig::new(5, WINDOW_MS).with_status_code(503);
        let limiter = RateLimiter::new(config, SystemClock).unwrap();
        assert_eq!(limiter.status_code(), 503);
    }

    #[test]
    fn test_form_preset() {
        let config = RateLimitConfig::form();
        assert_eq!(config.limit, 5);
        assert_eq!(config.window_ms, 900_000);
        assert_eq!(config.status_code, 429);
    }

    #[test]
    fn test_rejects_zero_window() {
        let result = RateLimiter::new(RateLimitConfig::new(5, 0), SystemClock);
        assert!(matches!(result, Err(ConfigError::ZeroWindow)));
    }

    #[test]
    fn test_rejects_out_of_range_window() {
        let result = RateLimiter::new(RateLimitConfig::new(5, u64::MAX), SystemClock);
        assert!(matches!(result, Err(ConfigError::DurationOutOfRange(_))));
    }

    #[test]
    fn test_five_per_window_scenario() {
        let (limiter, clock) = limiter(5);
        let ip = ClientIdentity::new("1.2.3.4");

        let remaining: Vec<u32> = (0..5)
            .map(|_| {
                let decision = limiter.check_limit(&ip);
                assert!(decision.allowed);
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let sixth = limiter.check_limit(&ip);
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert_eq!(sixth.retry_after_secs, Some(900));
        assert_eq!(sixth.reset, clock.now() + TimeDelta::milliseconds(900_000));
    }

    #[test]
    fn test_retry_after_shrinks_as_window_runs_out() {
        let (limiter, clock) = limiter(1);
        let ip = ClientIdentity::new("1.2.3.4");

        assert!(limiter.check_limit(&ip).allowed);
        clock.advance_ms(600_500);

        let denied = limiter.check_limit(&ip);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, Some(300));
    }

    #[test]
    fn test_window_reset_starts_new_count() {
        let (limiter, clock) = limiter(2);
        let ip = ClientIdentity::new("1.2.3.4");

        limiter.check_limit(&ip);
        limiter.check_limit(&ip);
        assert!(!limiter.check_limit(&ip).allowed);

        clock.advance_ms(WINDOW_MS as i64);

        let decision = limiter.check_limit(&ip);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn test_identities_do_not_interfere() {
        let (limiter, _clock) = limiter(1);
        let a = ClientIdentity::new("10.0.0.1");
        let b = ClientIdentity::new("10.0.0.2");

        assert!(limiter.check_limit(&a).allowed);
        assert!(!limiter.check_limit(&a).allowed);

        let other = limiter.check_limit(&b);
        assert!(other.allowed);
        assert_eq!(other.remaining, 0);
    }

    #[test]
    fn test_blank_identity_shares_unknown_bucket() {
        let (limiter, _clock) = limiter(1);

        assert!(limiter.check_limit(&ClientIdentity::new("")).allowed);
        assert!(!limiter.check_limit(&ClientIdentity::unknown()).allowed);
    }

    #[test]
    fn test_check_purges_other_expired_entries() {
        let (limiter, clock) = limiter(5);

        limiter.check_limit(&ClientIdentity::new("10.0.0.1"));
        limiter.check_limit(&ClientIdentity::new("10.0.0.2"));
        assert_eq!(limiter.tracked(), 2);

        clock.advance_ms(WINDOW_MS as i64 + 1);
        limiter.check_limit(&ClientIdentity::new("10.0.0.3"));

        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_purge_expired_without_traffic() {
        let (limiter, clock) = limiter(5);
        limiter.check_limit(&ClientIdentity::new("10.0.0.1"));

        assert_eq!(limiter.purge_expired(), 0);
        clock.advance_ms(WINDOW_MS as i64);
        assert_eq!(limiter.purge_expired(), 1);
        assert_eq!(limiter.tracked(), 0);
    }

    #[test]
    fn test_concurrent_checks_count_every_request() {
        use std::sync::Arc;

        let (limiter, _clock) = limiter(50);
        let limiter = Arc::new(limiter);
        let ip = ClientIdentity::new("1.2.3.4");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let ip = ip.clone();
                std::thread::spawn(move || {
                    (0..10).filter(|_| limiter.check_limit(&ip).allowed).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
