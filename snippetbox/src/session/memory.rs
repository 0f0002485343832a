//! In-process session store

use super::record::{SessionError, SessionId, SessionRecord};
use super::store::SessionStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Session store kept in a map inside the process
///
/// Sessions are lost on restart. Expired entries are skipped by `find` and
/// swept by `delete_expired`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when no records are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let now = Utc::now();
        Ok(self
            .records
            .read()
            .get(id)
            .filter(|record| !record.is_expired(now))
            .cloned())
    }

    async fn commit(&self, id: &SessionId, record: &SessionRecord) -> Result<(), SessionError> {
        self.records.write().insert(id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionError> {
        self.records.write().remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}
