//! Client identity used as the rate-limit key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Identifies the caller for rate limiting, usually by network address.
///
/// Blank input is folded into a shared `"unknown"` bucket instead of
/// being rejected, so a request without a resolvable address is still
/// counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Bucket used when no identity could be determined.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Self::unknown()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientIdentity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<IpAddr> for ClientIdentity {
    fn from(addr: IpAddr) -> Self {
        Self(addr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identity_maps_to_unknown() {
        assert!(ClientIdentity::new("").is_unknown());
        assert!(ClientIdentity::new("   ").is_unknown());
        assert_eq!(ClientIdentity::new("").as_str(), "unknown");
    }

    #[test]
    fn test_identity_is_trimmed() {
        assert_eq!(ClientIdentity::new(" 1.2.3.4 ").as_str(), "1.2.3.4");
    }

    #[test]
    fn test_identity_from_ip() {
        let addr: IpAddr = "10.0.0.7".parse().unwrap();
        assert_eq!(ClientIdentity::from(addr), ClientIdentity::new("10.0.0.7"));
    }
}
