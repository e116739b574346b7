//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use guard_core::{CsrfConfig, RateLimitConfig};
use guard_types::{ConfigError, RateLimitScope};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rate_limit: RateLimitConfig,
    /// Limit for form submissions, on top of `rate_limit`.
    pub form_rate_limit: RateLimitConfig,
    pub csrf: CsrfConfig,
    pub trust_proxy: bool,
    pub sweep_interval: Duration,
    /// OTLP collector; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, failing on the first bad value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&lookup, "PORT", 3000)?;

        let defaults = RateLimitConfig::default();
        let mut rate_limit = RateLimitConfig::new(
            parse_or(&lookup, "RATE_LIMIT_MAX", defaults.limit)?,
            parse_or(&lookup, "RATE_LIMIT_WINDOW_MS", defaults.window_ms)?,
        )
        .with_scope(parse_or(&lookup, "RATE_LIMIT_SCOPE", RateLimitScope::default())?)
        .with_status_code(parse_or(&lookup, "RATE_LIMIT_STATUS_CODE", defaults.status_code)?);
        if let Some(message) = lookup("RATE_LIMIT_MESSAGE").filter(|m| !m.trim().is_empty()) {
            rate_limit = rate_limit.with_message(message);
        }
        rate_limit.validate()?;

        // Form submissions share the message and status of the site-wide limit.
        let form_defaults = RateLimitConfig::form();
        let form_rate_limit = RateLimitConfig::new(
            parse_or(&lookup, "FORM_RATE_LIMIT_MAX", form_defaults.limit)?,
            parse_or(&lookup, "FORM_RATE_LIMIT_WINDOW_MS", form_defaults.window_ms)?,
        )
        .with_message(rate_limit.message.clone())
        .with_status_code(rate_limit.status_code);
        form_rate_limit.validate()?;

        let csrf = CsrfConfig {
            token_ttl_ms: parse_or(&lookup, "CSRF_TOKEN_TTL_MS", CsrfConfig::default().token_ttl_ms)?,
        };
        csrf.validate()?;

        let trust_proxy = parse_bool_or(&lookup, "TRUST_PROXY", false)?;

        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", 60)?;
        if sweep_secs == 0 {
            return Err(invalid("SWEEP_INTERVAL_SECS", "0").into());
        }

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.trim().is_empty());

        Ok(Self {
            port,
            rate_limit,
            form_rate_limit,
            csrf,
            trust_proxy,
            sweep_interval: Duration::from_secs(sweep_secs),
            otlp_endpoint,
        })
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, &raw)),
        None => Ok(default),
    }
}

fn parse_bool_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.rate_limit.limit, 100);
        assert_eq!(config.rate_limit.window_ms, 900_000);
        assert_eq!(config.rate_limit.scope, RateLimitScope::AllRequests);
        assert_eq!(config.rate_limit.status_code, 429);
        assert_eq!(config.form_rate_limit.limit, 5);
        assert_eq!(config.form_rate_limit.window_ms, 900_000);
        assert_eq!(config.csrf.token_ttl_ms, 86_400_000);
        assert!(!config.trust_proxy);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_MS", "60000"),
            ("RATE_LIMIT_MESSAGE", "Slow down"),
            ("RATE_LIMIT_SCOPE", "mutating"),
            ("RATE_LIMIT_STATUS_CODE", "503"),
            ("FORM_RATE_LIMIT_MAX", "3"),
            ("FORM_RATE_LIMIT_WINDOW_MS", "120000"),
            ("CSRF_TOKEN_TTL_MS", "3600000"),
            ("TRUST_PROXY", "true"),
            ("SWEEP_INTERVAL_SECS", "30"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit.limit, 5);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.message, "Slow down");
        assert_eq!(config.rate_limit.scope, RateLimitScope::MutatingOnly);
        assert_eq!(config.rate_limit.status_code, 503);
        assert_eq!(config.form_rate_limit.limit, 3);
        assert_eq!(config.form_rate_limit.window_ms, 120_000);
        assert_eq!(config.form_rate_limit.message, "Slow down");
        assert_eq!(config.form_rate_limit.status_code, 503);
        assert_eq!(config.csrf.token_ttl_ms, 3_600_000);
        assert!(config.trust_proxy);
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    }

    #[test]
    fn test_zero_values_fail() {
        assert!(load(&[("RATE_LIMIT_MAX", "0")]).is_err());
        assert!(load(&[("RATE_LIMIT_WINDOW_MS", "0")]).is_err());
        assert!(load(&[("FORM_RATE_LIMIT_MAX", "0")]).is_err());
        assert!(load(&[("RATE_LIMIT_STATUS_CODE", "200")]).is_err());
        assert!(load(&[("CSRF_TOKEN_TTL_MS", "0")]).is_err());
        assert!(load(&[("SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_unparseable_values_fail() {
        let err = load(&[("RATE_LIMIT_MAX", "lots")]).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_MAX"));

        assert!(load(&[("PORT", "http")]).is_err());
        assert!(load(&[("TRUST_PROXY", "maybe")]).is_err());
        assert!(load(&[("RATE_LIMIT_SCOPE", "some")]).is_err());
    }
}
