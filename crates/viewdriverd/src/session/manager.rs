//! Process-wide registry of live sessions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, info};

use super::{SESSION_TARGET, Session};
use crate::error::WebDriverError;

/// Session registry enforcing the concurrent-session limit.
///
/// Built once per server and shared behind an [`Arc`]; tests build their own
/// instances.
#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    task_timeout: Option<Duration>,
}

impl SessionManager {
    /// Creates a registry admitting at most `max_sessions` live sessions
    /// (clamped to at least one).
    #[must_use]
    pub fn new(max_sessions: usize, task_timeout: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            task_timeout,
        }
    }

    /// Maximum number of concurrent sessions.
    #[must_use]
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Allocates and registers a new session in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns `UnknownError` when the registry is already full; existing
    /// sessions are left untouched.
    pub fn allocate(self: &Arc<Self>) -> Result<Arc<Session>, WebDriverError> {
        let mut sessions = self.write();
        if sessions.len() >= self.max_sessions {
            return Err(WebDriverError::unknown_error(self.limit_message()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(
            id.clone(),
            self.task_timeout,
            Arc::downgrade(self),
        ));
        sessions.insert(id, Arc::clone(&session));
        debug!(target: SESSION_TARGET, session_id = session.id(), "allocated session");
        Ok(session)
    }

    /// Looks up a live session.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.read().get(session_id).cloned()
    }

    /// Looks up a live session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when the id is unknown or terminated.
    pub fn lookup(&self, session_id: &str) -> Result<Arc<Session>, WebDriverError> {
        self.get(session_id)
            .ok_or_else(|| WebDriverError::session_not_found(session_id))
    }

    /// Snapshot of the live sessions.
    #[must_use]
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<_> = self.read().values().cloned().collect();
        sessions.sort_by(|left, right| left.id().cmp(right.id()));
        sessions
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Terminates every live session, returning how many there were.
    pub fn terminate_all(&self) -> usize {
        let sessions: Vec<_> = self.read().values().cloned().collect();
        for session in &sessions {
            session.terminate();
        }
        if !sessions.is_empty() {
            info!(target: SESSION_TARGET, count = sessions.len(), "terminated all sessions");
        }
        sessions.len()
    }

    pub(crate) fn remove(&self, session_id: &str) -> Option<Arc<Session>> {
        self.write().remove(session_id)
    }

    fn limit_message(&self) -> String {
        match self.max_sessions {
            1 => "cannot start session: only one session at the moment".to_owned(),
            limit => format!("cannot start session: only {limit} sessions at the moment"),
        }
    }

    // The map holds no cross-entry invariant, so a poisoned lock is safe to
    // keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(1, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn manager() -> Arc<SessionManager> {
        Arc::new(SessionManager::default())
    }

    #[rstest]
    fn second_allocation_is_rejected(manager: Arc<SessionManager>) {
        let first = manager.allocate().expect("first session");
        let error = manager.allocate().expect_err("limit reached");

        assert_eq!(error.status(), StatusCode::UnknownError);
        assert!(error.message().contains("only one session at the moment"));
        assert_eq!(manager.len(), 1);
        assert!(manager.get(first.id()).is_some());
    }

    #[rstest]
    fn terminating_frees_the_slot(manager: Arc<SessionManager>) {
        let first = manager.allocate().expect("first session");
        first.terminate();

        assert!(manager.is_empty());
        let error = manager.lookup(first.id()).expect_err("removed");
        assert_eq!(error.status(), StatusCode::SessionNotFound);
        manager.allocate().expect("slot freed");
    }

    #[test]
    fn configurable_limit_is_reported() {
        let manager = Arc::new(SessionManager::new(2, None));
        manager.allocate().expect("first");
        manager.allocate().expect("second");
        let error = manager.allocate().expect_err("third");
        assert!(error.message().contains("only 2 sessions"));
    }

    #[rstest]
    fn terminate_all_empties_registry(manager: Arc<SessionManager>) {
        manager.allocate().expect("session");
        assert_eq!(manager.terminate_all(), 1);
        assert!(manager.is_empty());
    }
}
