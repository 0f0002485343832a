//! Data access for snippets and users
//!
//! Handlers depend on the [`SnippetStore`] and [`UserStore`] traits; the
//! SQLite implementations live in [`sqlite`].

pub mod sqlite;

use crate::auth::password::PasswordError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A published snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Snippet {
    /// Snippet id
    pub id: i64,
    /// Title
    pub title: String,
    /// Body
    pub content: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Time after which the snippet is hidden
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Creation time for display
    #[must_use]
    pub fn created_display(&self) -> String {
        human_date(&self.created)
    }

    /// Expiry time for display
    #[must_use]
    pub fn expires_display(&self) -> String {
        human_date(&self.expires)
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// User id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login e-mail address, unique
    pub email: String,
    /// Argon2id PHC string
    pub hashed_password: String,
    /// Signup time
    pub created: DateTime<Utc>,
}

impl User {
    /// Signup time for display
    #[must_use]
    pub fn created_display(&self) -> String {
        human_date(&self.created)
    }
}

/// Format a timestamp as `02 Jan 2024 at 15:04` (UTC)
#[must_use]
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}

/// Data access errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No matching record
    #[error("no matching record found")]
    NoRecord,

    /// E-mail address already registered
    #[error("duplicate email")]
    DuplicateEmail,

    /// Unknown e-mail address or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// New password equals the current one
    #[error("new password is the same as the old one")]
    SamePassword,

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hashing failure
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Blocking hashing task did not complete
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Snippet persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Up to ten most recent unexpired snippets, newest first
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError>;

    /// One unexpired snippet
    async fn get(&self, id: i64) -> Result<Snippet, ModelError>;

    /// Insert a snippet expiring `expires_days` from now, returning its id
    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, ModelError>;
}

/// Account persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register an account; `DuplicateEmail` if the address is taken
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError>;

    /// Check credentials and return the user id, or `InvalidCredentials`
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError>;

    /// Look a user up by id
    async fn get(&self, id: i64) -> Result<User, ModelError>;

    /// Change a password after checking the current one
    async fn password_update(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ModelError>;
}
