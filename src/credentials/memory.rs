//! In-process credential store

use super::{CredentialRecord, CredentialStore, UpsertOutcome};
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Credential store backed by a map in process memory
///
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, CredentialRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, name: &str) -> AppResult<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn list(&self) -> AppResult<Vec<CredentialRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn upsert(&self, record: CredentialRecord) -> AppResult<UpsertOutcome> {
        let previous = self
            .records
            .write()
            .await
            .insert(record.name.clone(), record);
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        Ok(self.records.write().await.remove(name).is_some())
    }
}
