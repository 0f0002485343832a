//! Session loading, saving and per-token request serialization

use super::handle::{Session, SessionStatus};
use super::record::{SessionError, SessionId, SessionRecord};
use super::store::SessionStore;
use crate::config::{SameSite, SessionSettings};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "session";

/// Longest lifetime or idle timeout a configuration may ask for
pub const MAX_SESSION_LIFETIME: Duration = Duration::days(3650);

/// Cookie and expiry settings used by the session manager
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Cookie name for the session token
    pub cookie_name: String,
    /// Cookie path
    pub cookie_path: String,
    /// HTTP-only cookie (recommended: true)
    pub http_only: bool,
    /// Secure cookie (HTTPS only)
    pub secure: bool,
    /// SameSite policy
    pub same_site: SameSite,
    /// Absolute lifetime of a session
    pub lifetime: Duration,
    /// Inactivity period after which a session expires
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            http_only: true,
            secure: !cfg!(debug_assertions),
            same_site: SameSite::Lax,
            lifetime: Duration::hours(12),
            idle_timeout: None,
        }
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        let cap = MAX_SESSION_LIFETIME.num_seconds();
        let secs = |s: u64| Duration::seconds(i64::try_from(s).map_or(cap, |s| s.min(cap)));
        Self {
            cookie_name: settings.cookie_name.clone(),
            cookie_path: "/".to_string(),
            http_only: true,
            secure: settings.secure,
            same_site: settings.same_site,
            lifetime: secs(settings.lifetime_secs),
            idle_timeout: settings.idle_timeout_secs.map(secs),
        }
    }
}

/// What the response must do with the session cookie after a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    /// Leave the cookie alone
    Unchanged,
    /// Set the cookie to `id`, valid for `max_age` seconds
    Set {
        /// Token to send
        id: SessionId,
        /// Seconds until the record expires
        max_age: i64,
    },
}

type LockTable = Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>;

/// Exclusive hold on one session token for the duration of a request
///
/// Dropping the lock releases it and forgets the token's table entry when no
/// other request is waiting on it.
pub struct SessionLock {
    id: SessionId,
    mutex: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl std::fmt::Debug for SessionLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLock")
            .field("id", &self.id)
            .field("held", &self.guard.is_some())
            .finish()
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.locks.lock();
        let unused = table
            .get(&self.id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.mutex) && Arc::strong_count(entry) == 2);
        if unused {
            table.remove(&self.id);
        }
    }
}

struct Inner {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    locks: Arc<LockTable>,
}

/// Loads and saves sessions and keeps concurrent requests for one token apart
///
/// Cheap to clone; clones share the store and lock table.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("locked_tokens", &self.inner.locks.lock().len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager over `store`
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                locks: Arc::new(Mutex::new(HashMap::new())),
            }),
        }
    }

    /// The backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Cookie and expiry settings
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Wait until no other request holds `id`, then hold it
    pub async fn lock(&self, id: &SessionId) -> SessionLock {
        let mutex = self
            .inner
            .locks
            .lock()
            .entry(id.clone())
            .or_default()
            .clone();

        let mut lock = SessionLock {
            id: id.clone(),
            mutex,
            guard: None,
            locks: self.inner.locks.clone(),
        };
        lock.guard = Some(lock.mutex.clone().lock_owned().await);
        lock
    }

    /// Load the session for `id`, or start an empty one
    ///
    /// Unknown and expired tokens both yield a new session without a token.
    pub async fn load(&self, id: Option<SessionId>) -> Result<Session, SessionError> {
        let store = self.inner.store.clone();
        let lifetime = self.inner.config.lifetime;

        if let Some(id) = id {
            if let Some(record) = store.find(&id).await? {
                if !record.is_expired(Utc::now()) {
                    return Ok(Session::existing(store, lifetime, id, record));
                }
            }
            tracing::debug!("session token not found, starting a new session");
        }
        Ok(Session::fresh(store, lifetime))
    }

    /// Write `session` back to the store
    ///
    /// Unmodified sessions are only rewritten when an idle timeout is set,
    /// so that activity keeps extending them.
    pub async fn save(&self, session: &Session) -> Result<CookieUpdate, SessionError> {
        let snapshot = session.snapshot();
        let config = &self.inner.config;

        if snapshot.status == SessionStatus::Unmodified
            && (config.idle_timeout.is_none() || snapshot.id.is_none())
        {
            return Ok(CookieUpdate::Unchanged);
        }

        let id = snapshot.id.unwrap_or_else(|| session.ensure_id());
        let now = Utc::now();
        let expiry = config
            .idle_timeout
            .map_or(snapshot.deadline, |idle| (now + idle).min(snapshot.deadline));

        let record = SessionRecord {
            values: snapshot.values,
            deadline: snapshot.deadline,
            expiry,
        };
        self.inner.store.commit(&id, &record).await?;

        Ok(CookieUpdate::Set {
            id,
            max_age: (expiry - now).num_seconds().max(0),
        })
    }

    /// Periodically sweep expired records out of the store
    pub fn spawn_cleanup(&self, every: std::time::Duration) -> JoinHandle<()> {
        let store = self.inner.store.clone();
        let locks = self.inner.locks.clone();
        let every = every.max(std::time::Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match store.delete_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "swept expired sessions"),
                    Err(err) => tracing::warn!(error = %err, "failed to sweep expired sessions"),
                }
                // entries orphaned by cancelled lock waits
                locks.lock().retain(|_, entry| Arc::strong_count(entry) > 1);
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn locked_tokens(&self) -> usize {
        self.inner.locks.lock().len()
    }
}
