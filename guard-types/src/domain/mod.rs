//! Domain models for the form guard.

pub mod csrf;
pub mod identity;
pub mod rate_limit;

pub use csrf::{CsrfSession, CsrfToken, SessionId, is_safe_method};
pub use identity::ClientIdentity;
pub use rate_limit::{Decision, RateLimitEntry, RateLimitScope};
