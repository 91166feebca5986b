use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;

/// One stored analysis, addressed by its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: String,
    /// Serialized analysis JSON; opaque at this level.
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl StoredAnalysis {
    pub fn new(payload: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            created_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }
}

/// Trait for storing and retrieving analysis results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, entry: StoredAnalysis) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Option<StoredAnalysis>, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory implementation of ResultStore with lazy TTL expiry: expired
/// entries are dropped when read and swept whenever a new entry is saved.
pub struct InMemoryResultStore {
    entries: Arc<DashMap<String, StoredAnalysis>>,
    ttl: Duration,
}

impl InMemoryResultStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    fn is_expired(&self, entry: &StoredAnalysis) -> bool {
        entry.age() >= self.ttl
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.age() < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(&self, entry: StoredAnalysis) -> Result<(), StoreError> {
        self.sweep();
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let entry = match self.entries.get(id) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        if self.is_expired(&entry) {
            self.entries.remove(id);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.entries.remove(id);
        Ok(())
    }
}
