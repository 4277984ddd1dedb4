//! In-memory registry of active call sessions

use crate::domain::call::session::CallSession;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Concurrent map of call SID to session
///
/// Sessions are inserted when a call-start event is processed and
/// evicted a short grace period after the call ends. Lock scopes are
/// kept short and never held across await points.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, CallSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, replacing any stale entry for the SID
    pub fn insert(&self, session: CallSession) {
        let mut map = self.inner.write().expect("session store poisoned");
        map.insert(session.id().to_string(), session);
    }

    /// Whether a session exists for the SID
    pub fn contains(&self, call_sid: &str) -> bool {
        let map = self.inner.read().expect("session store poisoned");
        map.contains_key(call_sid)
    }

    /// Snapshot of a session
    pub fn get(&self, call_sid: &str) -> Option<CallSession> {
        let map = self.inner.read().expect("session store poisoned");
        map.get(call_sid).cloned()
    }

    /// Mutate a session in place, returning the closure's result
    pub fn with_session<T>(
        &self,
        call_sid: &str,
        f: impl FnOnce(&mut CallSession) -> T,
    ) -> Option<T> {
        let mut map = self.inner.write().expect("session store poisoned");
        map.get_mut(call_sid).map(f)
    }

    /// Evict a session, returning it if present
    pub fn remove(&self, call_sid: &str) -> Option<CallSession> {
        let mut map = self.inner.write().expect("session store poisoned");
        map.remove(call_sid)
    }

    pub fn len(&self) -> usize {
        let map = self.inner.read().expect("session store poisoned");
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
