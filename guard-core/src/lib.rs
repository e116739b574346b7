//! # Guard Core
//!
//! Concrete implementations of the two request guards and the adapters they
//! need:
//! - [`RateLimiter`] - fixed-window request counting per client identity
//! - [`CsrfGuard`] - per-session secret issuance and validation
//! - [`InMemorySessionStore`] - `DashMap` implementation of the session store port
//! - [`SystemClock`] - wall clock (a `MockClock` is available for tests)
//!
//! Neither guard knows about the other; the HTTP layer sequences them.

pub mod clock;
pub mod csrf;
pub mod rate_limiter;
pub mod security;
pub mod session_store;

pub use clock::SystemClock;
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
pub use csrf::{CsrfConfig, CsrfGuard, IssuedToken};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use session_store::InMemorySessionStore;
