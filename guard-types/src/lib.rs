//! # Guard Types
//!
//! Domain types and port traits for the form-submission guard.
//! This crate has ZERO IO dependencies - only data structures,
//! rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Rate limit entries and decisions, CSRF sessions, client identity
//! - `ports/` - Trait definitions that adapters must implement (clock, session store)
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Configuration, rejection and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ClientIdentity, CsrfSession, CsrfToken, Decision, RateLimitEntry, RateLimitScope, SessionId,
    is_safe_method,
};
pub use dto::*;
pub use error::{AppError, ConfigError, GuardRejection};
pub use ports::{Clock, CsrfSessionStore};
