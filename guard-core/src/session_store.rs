//! In-memory CSRF session store.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use guard_types::{CsrfSession, CsrfSessionStore, SessionId};

/// Process-local session store backed by a `DashMap`.
///
/// State lives only as long as the process; a multi-instance deployment
/// needs a shared implementation of [`CsrfSessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, CsrfSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CsrfSessionStore for InMemorySessionStore {
    fn load(&self, session: &SessionId) -> Option<CsrfSession> {
        self.sessions.get(session).map(|record| record.value().clone())
    }

    fn save(&self, session: SessionId, record: CsrfSession) {
        self.sessions.insert(session, record);
    }

    fn load_or_replace(
        &self,
        session: SessionId,
        keep: &dyn Fn(&CsrfSession) -> bool,
        fresh: &dyn Fn() -> CsrfSession,
    ) -> CsrfSession {
        match self.sessions.entry(session) {
            Entry::Occupied(mut occupied) => {
                if !keep(occupied.get()) {
                    occupied.insert(fresh());
                }
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(fresh()).value().clone(),
        }
    }

    fn retain(&self, keep: &dyn Fn(&CsrfSession) -> bool) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| keep(record));
        before.saturating_sub(self.sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
