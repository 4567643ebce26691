//! Script persistence.

use std::collections::HashMap;

use adreel_models::ScriptRecord;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for generated scripts.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn save(&self, record: &ScriptRecord) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<ScriptRecord>>;
}

/// Process-local script store.
#[derive(Default)]
pub struct InMemoryScriptStore {
    records: RwLock<HashMap<Uuid, ScriptRecord>>,
}

impl InMemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ScriptStore for InMemoryScriptStore {
    async fn save(&self, record: &ScriptRecord) -> StoreResult<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ScriptRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }
}
