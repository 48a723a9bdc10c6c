//! Credential persistence and decryption
//!
//! A credential record pairs an encrypted provider key with the model id it
//! should be used for. Records are written by the admin surface and read by
//! the router on every request; the record is the single source of truth for
//! which model a category currently targets.

pub mod cipher;
pub mod file;
pub mod memory;
pub mod vault;

pub use cipher::SecretCipher;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use vault::{StoreHealth, Vault};

use crate::config::{CredentialsConfig, StoreBackend};
use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One stored credential, secret still encrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub name: String,
    pub encrypted_secret: String,
    pub model_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

impl CredentialRecord {
    /// A record missing either its secret or its model id cannot serve a route
    pub fn is_usable(&self) -> bool {
        !self.encrypted_secret.trim().is_empty() && !self.model_id.trim().is_empty()
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            name: self.name.clone(),
            model_id: self.model_id.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            created_by: self.created_by.clone(),
        }
    }
}

/// Record metadata safe to show to administrators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSummary {
    pub name: String,
    pub model_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

/// Decrypted credential handed to the router
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub name: String,
    pub model_id: String,
    pub secret: String,
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("name", &self.name)
            .field("model_id", &self.model_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Whether an upsert inserted or replaced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Open the configured backend and wrap it with the cipher
///
/// # Errors
/// Fails when the passphrase variable is unset or the file store cannot be loaded.
pub async fn open_vault(config: &CredentialsConfig) -> AppResult<Vault> {
    let cipher = SecretCipher::from_passphrase(&config.encryption_passphrase()?)?;
    let store: Arc<dyn CredentialStore> = match config.backend {
        StoreBackend::File => Arc::new(JsonFileStore::open(&config.path).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; credentials are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(Vault::new(store, cipher))
}

/// Persistence backend for credential records
///
/// Implementations only store what they are given; encryption, trimming and
/// timestamps are handled by [`Vault`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, name: &str) -> AppResult<Option<CredentialRecord>>;

    /// All records, ordered by name
    async fn list(&self) -> AppResult<Vec<CredentialRecord>>;

    async fn upsert(&self, record: CredentialRecord) -> AppResult<UpsertOutcome>;

    /// Returns `false` when no record had that name
    async fn delete(&self, name: &str) -> AppResult<bool>;
}
