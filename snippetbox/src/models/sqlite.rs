//! SQLite implementations of the data access traits

use super::{ModelError, Snippet, SnippetStore, User, UserStore};
use crate::auth::password::PasswordHasher;
use crate::config::DatabaseSettings;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open a connection pool for `settings`
///
/// In-memory databases are held on a single connection that never recycles,
/// since each new connection would see an empty database.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.url)?.foreign_keys(true);

    if settings.url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    } else {
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(options)
            .await
    }
}

/// Apply the embedded migrations
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Snippets table
#[derive(Debug, Clone)]
pub struct SqliteSnippetModel {
    pool: SqlitePool,
}

impl SqliteSnippetModel {
    /// Create a model over `pool`
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetStore for SqliteSnippetModel {
    async fn latest(&self) -> Result<Vec<Snippet>, ModelError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? ORDER BY id DESC LIMIT 10",
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;
        Ok(snippets)
    }

    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ? AND id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)
    }

    async fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, ModelError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO snippets (title, content, created, expires) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now + Duration::days(expires_days))
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

/// Users table
#[derive(Debug, Clone)]
pub struct SqliteUserModel {
    pool: SqlitePool,
    hasher: PasswordHasher,
}

impl SqliteUserModel {
    /// Create a model over `pool` using default hashing parameters
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_hasher(pool, PasswordHasher::new())
    }

    /// Create a model with a specific password hasher
    #[must_use]
    pub const fn with_hasher(pool: SqlitePool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    async fn hash(&self, password: &str) -> Result<String, ModelError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        Ok(tokio::task::spawn_blocking(move || hasher.hash(&password)).await??)
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool, ModelError> {
        let hasher = self.hasher;
        let password = password.to_owned();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await??)
    }

    async fn stored_hash(&self, id: i64) -> Result<String, ModelError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT hashed_password FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(hash,)| hash).ok_or(ModelError::NoRecord)
    }
}

#[async_trait]
impl UserStore for SqliteUserModel {
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let hashed = self.hash(password).await?;
        let result = sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(hashed)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(ModelError::DuplicateEmail)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, hashed_password FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, hash)) = row else {
            return Err(ModelError::InvalidCredentials);
        };

        if self.verify(password, hash).await? {
            Ok(id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    async fn get(&self, id: i64) -> Result<User, ModelError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, hashed_password, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)
    }

    async fn password_update(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ModelError> {
        let hash = self.stored_hash(id).await?;
        if !self.verify(current_password, hash).await? {
            return Err(ModelError::InvalidCredentials);
        }
        if current_password == new_password {
            return Err(ModelError::SamePassword);
        }

        let hashed = self.hash(new_password).await?;
        sqlx::query("UPDATE users SET hashed_password = ? WHERE id = ?")
            .bind(hashed)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Migrated in-memory pool for tests
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let pool = connect(&settings).await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
