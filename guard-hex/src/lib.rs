//! # Guard Hex
//!
//! Request gate service and HTTP adapter for the form guard.
//!
//! ## Architecture
//!
//! - `service/` - Composite gate (rate limit, then CSRF) plus the contact form use case
//! - `inbound/` - HTTP adapter (Axum server, middleware, handlers)
//! - `sweeper/` - Background purge of expired guard state
//!
//! The service is generic over `S: CsrfSessionStore` and `C: Clock`, allowing
//! different stores and clocks to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;
pub mod sweeper;


pub use service::{GuardService, SweepReport};
pub use sweeper::Sweeper;
