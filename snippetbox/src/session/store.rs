//! Backing store abstraction for session records

use super::record::{SessionError, SessionId, SessionRecord};
use async_trait::async_trait;

/// Persistence for session records
///
/// Stores never return a record whose expiry has passed.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load the live record for `id`
    async fn find(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError>;

    /// Insert or replace the record for `id`
    async fn commit(&self, id: &SessionId, record: &SessionRecord) -> Result<(), SessionError>;

    /// Remove the record for `id`, if any
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Remove every expired record, returning how many were removed
    async fn delete_expired(&self) -> Result<u64, SessionError>;
}
