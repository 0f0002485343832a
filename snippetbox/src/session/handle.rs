//! Request-scoped access to the visitor's session

use super::record::{SessionError, SessionId, SessionRecord};
use super::store::SessionStore;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a session needs writing back when the request completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing changed since load
    Unmodified,
    /// Values or token changed
    Modified,
}

#[derive(Debug)]
struct SessionState {
    id: Option<SessionId>,
    values: HashMap<String, Value>,
    deadline: DateTime<Utc>,
    status: SessionStatus,
}

/// Point-in-time copy of a session, taken when it is saved
#[derive(Debug, Clone)]
pub(crate) struct SessionSnapshot {
    pub id: Option<SessionId>,
    pub values: HashMap<String, Value>,
    pub deadline: DateTime<Utc>,
    pub status: SessionStatus,
}

/// Handle to the current visitor's session
///
/// Inserted into request extensions by the session middleware. Clones share
/// the same state, so a value put by a handler is seen by the middleware when
/// it saves the session. A session with no token is only created in the
/// store once something is written to it.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Session")
            .field("id", &state.id)
            .field("keys", &state.values.keys().collect::<Vec<_>>())
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn fresh(store: Arc<dyn SessionStore>, lifetime: Duration) -> Self {
        Self::with_state(
            store,
            lifetime,
            SessionState {
                id: None,
                values: HashMap::new(),
                deadline: Utc::now() + lifetime,
                status: SessionStatus::Unmodified,
            },
        )
    }

    pub(crate) fn existing(
        store: Arc<dyn SessionStore>,
        lifetime: Duration,
        id: SessionId,
        record: SessionRecord,
    ) -> Self {
        Self::with_state(
            store,
            lifetime,
            SessionState {
                id: Some(id),
                values: record.values,
                deadline: record.deadline,
                status: SessionStatus::Unmodified,
            },
        )
    }

    fn with_state(store: Arc<dyn SessionStore>, lifetime: Duration, state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            store,
            lifetime,
        }
    }

    /// Current token, if the session has one
    #[must_use]
    pub fn id(&self) -> Option<SessionId> {
        self.state.lock().id.clone()
    }

    /// Current save status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    /// Read `key` as `T`
    ///
    /// Returns `None` when the key is absent or holds a value of another type.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.state.lock().values.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Read `key` as a string
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    /// True when `key` is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().values.contains_key(key)
    }

    /// Store `value` under `key`
    pub fn put<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.state.lock();
        state.values.insert(key.into(), value);
        state.status = SessionStatus::Modified;
        Ok(())
    }

    /// Remove `key` and return it as `T`
    pub fn pop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut state = self.state.lock();
        let value = state.values.remove(key)?;
        state.status = SessionStatus::Modified;
        drop(state);
        serde_json::from_value(value).ok()
    }

    /// Remove `key` and return it as a string
    pub fn pop_string(&self, key: &str) -> Option<String> {
        self.pop(key)
    }

    /// Remove `key`
    pub fn remove(&self, key: &str) {
        let mut state = self.state.lock();
        if state.values.remove(key).is_some() {
            state.status = SessionStatus::Modified;
        }
    }

    /// Replace the token, keeping every value
    ///
    /// The old token is removed from the store straight away, so a copy of
    /// the old cookie stops working even if this request fails later.
    pub async fn renew_token(&self) -> Result<(), SessionError> {
        let old = {
            let mut state = self.state.lock();
            state.status = SessionStatus::Modified;
            state.deadline = Utc::now() + self.lifetime;
            state.id.replace(SessionId::generate())
        };

        if let Some(old) = old {
            self.store.delete(&old).await?;
        }
        Ok(())
    }

    /// Assign a token if the session has none yet and return it
    pub(crate) fn ensure_id(&self) -> SessionId {
        self.state
            .lock()
            .id
            .get_or_insert_with(SessionId::generate)
            .clone()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            id: state.id.clone(),
            values: state.values.clone(),
            deadline: state.deadline,
            status: state.status,
        }
    }
}
