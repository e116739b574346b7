//! Clock port.

use chrono::{DateTime, Utc};

/// Source of wall-clock time for window and expiry arithmetic.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
