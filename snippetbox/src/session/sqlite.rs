//! SQLite-backed session store
//!
//! Records live in the `sessions` table created by the embedded migrations.
//! The whole record is stored as JSON; the expiry is duplicated as unix
//! milliseconds so lookups and sweeps can filter in SQL.

use super::record::{SessionError, SessionId, SessionRecord};
use super::store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

/// Session store persisted in SQLite
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store over an already migrated pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn find(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM sessions WHERE token = ? AND expiry > ?")
                .bind(id.as_str())
                .bind(Utc::now().timestamp_millis())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(data,)| serde_json::from_str(&data))
            .transpose()
            .map_err(Into::into)
    }

    async fn commit(&self, id: &SessionId, record: &SessionRecord) -> Result<(), SessionError> {
        let data = serde_json::to_string(record)?;
        sqlx::query(
            "INSERT INTO sessions (token, data, expiry) VALUES (?, ?, ?) \
             ON CONFLICT (token) DO UPDATE SET data = excluded.data, expiry = excluded.expiry",
        )
        .bind(id.as_str())
        .bind(data)
        .bind(record.expiry.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiry <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
