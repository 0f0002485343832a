//! Application state shared by every handler

use crate::config::{SessionBackend, SnippetboxConfig};
use crate::models::sqlite::{self, SqliteSnippetModel, SqliteUserModel};
use crate::models::{SnippetStore, UserStore};
use crate::session::{MemoryStore, SessionConfig, SessionManager, SessionStore, SqliteStore};
use std::sync::Arc;

/// Application state for snippetbox
///
/// Cheap to clone; every field is shared.
///
/// # Example
///
/// ```rust,no_run
/// use snippetbox::{config::SnippetboxConfig, state::AppState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::connect(SnippetboxConfig::load(None)?).await?;
/// let app = snippetbox::routes::routes(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppState {
    config: Arc<SnippetboxConfig>,
    snippets: Arc<dyn SnippetStore>,
    users: Arc<dyn UserStore>,
    sessions: SessionManager,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from already built parts
    #[must_use]
    pub fn new(
        config: SnippetboxConfig,
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
        sessions: SessionManager,
    ) -> Self {
        Self {
            config: Arc::new(config),
            snippets,
            users,
            sessions,
        }
    }

    /// Open the database, run migrations and build the configured stores
    pub async fn connect(config: SnippetboxConfig) -> anyhow::Result<Self> {
        let pool = sqlite::connect(&config.database).await?;
        sqlite::migrate(&pool).await?;

        let store: Arc<dyn SessionStore> = match config.session.store {
            SessionBackend::Memory => Arc::new(MemoryStore::new()),
            SessionBackend::Sqlite => Arc::new(SqliteStore::new(pool.clone())),
        };
        let sessions = SessionManager::new(store, SessionConfig::from(&config.session));

        tracing::debug!(store = ?config.session.store, "application state ready");

        Ok(Self::new(
            config,
            Arc::new(SqliteSnippetModel::new(pool.clone())),
            Arc::new(SqliteUserModel::new(pool)),
            sessions,
        ))
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &SnippetboxConfig {
        &self.config
    }

    /// Snippet data access
    #[must_use]
    pub fn snippets(&self) -> &dyn SnippetStore {
        self.snippets.as_ref()
    }

    /// User data access
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    /// Session manager
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        snippets: crate::models::MockSnippetStore,
        users: crate::models::MockUserStore,
    ) -> Self {
        let config = SnippetboxConfig::for_tests();
        let sessions = SessionManager::new(
            Arc::new(MemoryStore::new()),
            SessionConfig::from(&config.session),
        );
        Self::new(config, Arc::new(snippets), Arc::new(users), sessions)
    }
}
