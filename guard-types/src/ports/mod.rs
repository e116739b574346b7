//! Port traits (interfaces for adapters).
//!
//! The guard components depend on these traits, not on concrete clocks or
//! stores, so tests can inject a controllable clock and isolated state.

mod clock;
mod session_store;

pub use clock::Clock;
pub use session_store::CsrfSessionStore;
