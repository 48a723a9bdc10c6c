//! JSON-file credential store
//!
//! The whole file is loaded at open and kept in memory. Every mutation
//! rewrites the file through a temporary sibling and a rename, so a crash
//! mid-write leaves the previous version intact.

use super::{CredentialRecord, CredentialStore, UpsertOutcome};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Credential store persisted as a JSON array on local disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, CredentialRecord>>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing or empty file is an empty store
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let records = load(&path).await?;

        tracing::info!(
            path = %path.display(),
            credentials = records.len(),
            "Loaded credential store"
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &BTreeMap<String, CredentialRecord>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| store_error(&self.path, "create directory for", e))?;
        }

        let list: Vec<&CredentialRecord> = records.values().collect();
        let data = serde_json::to_vec_pretty(&list).map_err(|e| {
            AppError::CredentialStore(format!("failed to serialize credentials: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| store_error(&tmp, "write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| store_error(&self.path, "replace", e))?;
        Ok(())
    }
}

async fn load(path: &Path) -> AppResult<BTreeMap<String, CredentialRecord>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(store_error(path, "read", e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    let list: Vec<CredentialRecord> = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::CredentialStore(format!(
            "credential file {} is corrupt: {}",
            path.display(),
            e
        ))
    })?;

    let mut records = BTreeMap::new();
    for record in list {
        if records.insert(record.name.clone(), record).is_some() {
            return Err(AppError::CredentialStore(format!(
                "credential file {} contains duplicate names",
                path.display()
            )));
        }
    }
    Ok(records)
}

fn store_error(path: &Path, action: &str, e: std::io::Error) -> AppError {
    AppError::CredentialStore(format!("failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl CredentialStore for JsonFileStore {
    async fn get(&self, name: &str) -> AppResult<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn list(&self) -> AppResult<Vec<CredentialRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn upsert(&self, record: CredentialRecord) -> AppResult<UpsertOutcome> {
        // Hold the write lock across the file write so writers are serialized
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let outcome = match next.insert(record.name.clone(), record) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        self.persist(&next).await?;
        *records = next;
        Ok(outcome)
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        let mut records = self.records.write().await;
        if !records.contains_key(name) {
            return Ok(false);
        }
        let mut next = records.clone();
        next.remove(name);
        self.persist(&next).await?;
        *records = next;
        Ok(true)
    }
}
