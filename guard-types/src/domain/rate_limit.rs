//! Fixed-window rate limit bookkeeping and decisions.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::csrf::is_safe_method;
use crate::error::ConfigError;

/// Per-identity counter for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl RateLimitEntry {
    /// Starts a fresh window at `now` with nothing counted yet.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// A window covers `[window_start, window_start + window)`.
    pub fn is_expired(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now.signed_duration_since(self.window_start) >= window
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.count = 0;
        self.window_start = now;
    }

    pub fn window_end(&self, window: TimeDelta) -> DateTime<Utc> {
        self.window_start + window
    }
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// End of the window the request was counted in.
    pub reset: DateTime<Utc>,
    /// Only set when the request was denied.
    pub retry_after_secs: Option<u64>,
}

impl Decision {
    pub fn admit(limit: u32, count: u32, reset: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit.saturating_sub(count),
            reset,
            retry_after_secs: None,
        }
    }

    pub fn deny(limit: u32, reset: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = reset.signed_duration_since(now).num_milliseconds().max(0) as u64;
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset,
            retry_after_secs: Some(millis.div_ceil(1000).max(1)),
        }
    }

    /// Reset time as Unix seconds, rounded up.
    pub fn reset_epoch_secs(&self) -> i64 {
        self.reset.timestamp_millis().div_euclid(1000)
            + i64::from(self.reset.timestamp_millis().rem_euclid(1000) != 0)
    }
}

/// Which requests the limiter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    #[default]
    AllRequests,
    /// Skip `GET`, `HEAD`, `OPTIONS` and `TRACE`.
    MutatingOnly,
}

impl RateLimitScope {
    pub fn applies_to(&self, method: &str) -> bool {
        match self {
            RateLimitScope::AllRequests => true,
            RateLimitScope::MutatingOnly => !is_safe_method(method),
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitScope::AllRequests => f.write_str("all"),
            RateLimitScope::MutatingOnly => f.write_str("mutating"),
        }
    }
}

impl FromStr for RateLimitScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RateLimitScope::AllRequests),
            "mutating" => Ok(RateLimitScope::MutatingOnly),
            other => Err(ConfigError::Invalid {
                key: "RATE_LIMIT_SCOPE".into(),
                value: other.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_window_expires_at_boundary() {
        let entry = RateLimitEntry::new(at(1_000));
        let window = TimeDelta::milliseconds(500);

        assert!(!entry.is_expired(at(1_499), window));
        assert!(entry.is_expired(at(1_500), window));
    }

    #[test]
    fn test_deny_rounds_retry_after_up() {
        let decision = Decision::deny(5, at(10_000), at(8_001));
        assert_eq!(decision.retry_after_secs, Some(2));
        assert_eq!(decision.remaining, 0);
        assert!(!decision.allowed);
    }

    #[test]
    fn test_admit_reports_remaining() {
        let decision = Decision::admit(5, 2, at(10_000));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 3);
        assert_eq!(decision.retry_after_secs, None);
    }

    #[test]
    fn test_reset_epoch_secs_rounds_up() {
        assert_eq!(Decision::admit(1, 1, at(10_000)).reset_epoch_secs(), 10);
        assert_eq!(Decision::admit(1, 1, at(10_001)).reset_epoch_secs(), 11);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!(
            "all".parse::<RateLimitScope>().unwrap(),
            RateLimitScope::AllRequests
        );
        assert_eq!(
            "Mutating".parse::<RateLimitScope>().unwrap(),
            RateLimitScope::MutatingOnly
        );
        assert!("sometimes".parse::<RateLimitScope>().is_err());
    }

    #[test]
    fn test_mutating_scope_skips_safe_methods() {
        let scope = RateLimitScope::MutatingOnly;
        assert!(!scope.applies_to("GET"));
        assert!(scope.applies_to("POST"));
        assert!(RateLimitScope::AllRequests.applies_to("GET"));
    }
}
