//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the request gate.

mod csrf;
mod handlers;
mod rate_limit;
mod server;
mod session;

pub use server::HttpServer;
pub use session::{SESSION_COOKIE, session_cookie, session_id};
