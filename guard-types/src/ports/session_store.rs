//! CSRF session store port.
//!
//! The session mechanism itself lives outside the guard; this port only
//! covers the one field the guard reads and writes per session.

use crate::domain::{CsrfSession, SessionId};

/// Storage for per-session CSRF secrets.
///
/// `save` replaces any previous record for the session, which is what
/// enforces the one-live-secret-per-session invariant.
pub trait CsrfSessionStore: Send + Sync + 'static {
    /// Returns the secret currently bound to the session, if any.
    fn load(&self, session: &SessionId) -> Option<CsrfSession>;

    /// Binds a secret to the session, overwriting the prior one.
    fn save(&self, session: SessionId, record: CsrfSession);

    /// Atomically returns the stored record if `keep` accepts it, otherwise
    /// stores and returns the record built by `fresh`.
    ///
    /// Concurrent callers for the same session observe the same record.
    fn load_or_replace(
        &self,
        session: SessionId,
        keep: &dyn Fn(&CsrfSession) -> bool,
        fresh: &dyn Fn() -> CsrfSession,
    ) -> CsrfSession;

    /// Drops every record for which `keep` returns false. Returns how many were removed.
    fn retain(&self, keep: &dyn Fn(&CsrfSession) -> bool) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
