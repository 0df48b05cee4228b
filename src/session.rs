use crate::pages::Page;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Credentials of a signed-in user as returned by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHandle {
    /// Email address the user signed in with
    pub email: String,

    /// Opaque provider token (Firebase ID token or a local token)
    #[serde(skip_serializing)]
    pub token: String,
}

/// Mutable state of one user's interaction sequence
///
/// Passed explicitly to the gate and the page registry; nothing reads it
/// from ambient globals.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub authenticated: bool,
    pub current_page: Page,
    pub user: Option<UserHandle>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            authenticated: false,
            current_page: Page::default(),
            user: None,
        }
    }
}

impl SessionState {
    /// Switch to the page with the given name
    ///
    /// Unknown names leave the current page untouched and return `None`.
    pub fn select_page(&mut self, name: &str) -> Option<Page> {
        let page = Page::from_name(name)?;
        self.current_page = page;
        Some(page)
    }
}

struct Entry {
    state: SessionState,
    expires_at: SystemTime,
}

/// All live sessions, keyed by the id stored in the `session` cookie
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create an empty anonymous session and return its id
    pub fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let entry = Entry {
            state: SessionState::default(),
            expires_at: SystemTime::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(session_id.clone(), entry);

        session_id
    }

    /// Snapshot of a session if it exists and has not expired
    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());

        sessions
            .get(session_id)
            .filter(|entry| entry.expires_at > SystemTime::now())
            .map(|entry| entry.state.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).is_some()
    }

    /// Store a new state for a session and extend its lifetime
    ///
    /// Returns `false` if the session is unknown or expired.
    pub fn put(&self, session_id: &str, state: SessionState) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get_mut(session_id) {
            Some(entry) if entry.expires_at > SystemTime::now() => {
                entry.state = state;
                entry.expires_at = SystemTime::now() + self.ttl;
                true
            }
            _ => false,
        }
    }

    /// Move a live session's new state under a fresh id
    ///
    /// The old id is forgotten, so a cookie issued before sign-in cannot
    /// ride along into the authenticated session. Returns `None` and keeps
    /// nothing if the old session is unknown or expired.
    pub fn rotate(&self, session_id: &str, state: SessionState) -> Option<String> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let now = SystemTime::now();
        match sessions.remove(session_id) {
            Some(entry) if entry.expires_at > now => {
                let new_id = Uuid::new_v4().to_string();
                sessions.insert(
                    new_id.clone(),
                    Entry {
                        state,
                        expires_at: now + self.ttl,
                    },
                );
                Some(new_id)
            }
            _ => None,
        }
    }

    /// Drop expired sessions, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        let now = SystemTime::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_are_anonymous_on_the_first_page() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create();
        let state = store.get(&id).unwrap();
        assert!(!state.authenticated);
        assert_eq!(state.current_page, Page::Dashboard);
        assert!(state.user.is_none());
    }

    #[test]
    fn put_replaces_state() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create();
        let mut state = store.get(&id).unwrap();
        state.select_page("Feedback");
        assert!(store.put(&id, state));
        assert_eq!(store.get(&id).unwrap().current_page, Page::Feedback);
        assert!(!store.put("missing", SessionState::default()));
    }

    #[test]
    fn rotate_moves_state_to_a_new_id() {
        let store = SessionStore::new(Duration::from_secs(60));
        let old = store.create();
        let state = SessionState {
            authenticated: true,
            ..SessionState::default()
        };

        let new = store.rotate(&old, state.clone()).unwrap();
        assert_ne!(new, old);
        assert!(!store.contains(&old));
        assert_eq!(store.get(&new), Some(state));
        assert_eq!(store.len(), 1);

        assert_eq!(store.rotate(&old, SessionState::default()), None);
    }

    #[test]
    fn rotate_refuses_expired_sessions() {
        let store = SessionStore::new(Duration::from_secs(0));
        let old = store.create();
        assert_eq!(store.rotate(&old, SessionState::default()), None);
        assert!(store.is_empty());
    }

    #[test]
    fn expired_sessions_are_invisible_and_purged() {
        let store = SessionStore::new(Duration::from_secs(0));
        let id = store.create();
        assert!(store.get(&id).is_none());
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_page_name_keeps_current_page() {
        let mut state = SessionState::default();
        state.select_page("Live Data");
        assert_eq!(state.select_page("Settings"), None);
        assert_eq!(state.current_page, Page::LiveData);
    }
}
