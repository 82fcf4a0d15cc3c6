use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewGeneration, StoredGeneration};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")] Sqlite(#[from] rusqlite::Error),
    #[error("storage task failed: {0}")] Task(String),
    #[error("corrupt record {id}: {reason}")] Corrupt { id: String, reason: String },
}

/// Persistence for generations. Records are immutable once created.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Assigns `id` and `created_at`.
    async fn create(&self, new: NewGeneration) -> Result<StoredGeneration, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredGeneration>, StoreError>;
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<StoredGeneration>, StoreError>;
}

pub(crate) fn stamp(new: NewGeneration) -> StoredGeneration {
    StoredGeneration {
        id: Uuid::new_v4(),
        idea: new.idea,
        roles_input: new.roles_input,
        monetization_type: new.monetization_type,
        tenant_type: new.tenant_type,
        tech_stack: new.tech_stack,
        ai_response: new.ai_response,
        // SQLite keeps microseconds.
        created_at: Utc::now().trunc_subsecs(6),
    }
}

/// In-process store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<StoredGeneration>>,
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn create(&self, new: NewGeneration) -> Result<StoredGeneration, StoreError> {
        let row = stamp(new);
        self.rows.write().push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredGeneration>, StoreError> {
        Ok(self.rows.read().iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<StoredGeneration>, StoreError> {
        // Rows are appended in creation order, so a stable sort keeps
        // insertion order among equal timestamps.
        let mut rows: Vec<_> = self.rows.read().iter().rev().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
