//! Encrypting facade over a credential store
//!
//! The router only ever sees [`Vault::get_by_name`]; the admin surface uses
//! the mutation methods.

use super::{
    CredentialRecord, CredentialStore, CredentialSummary, ResolvedCredential, SecretCipher,
    UpsertOutcome,
};
use crate::error::{AppError, AppResult};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Result of probing the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub healthy: bool,
    pub message: String,
    pub key_count: usize,
}

/// Credential store plus the cipher protecting its secrets
#[derive(Clone)]
pub struct Vault {
    store: Arc<dyn CredentialStore>,
    cipher: Arc<SecretCipher>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

impl Vault {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: SecretCipher) -> Self {
        Self {
            store,
            cipher: Arc::new(cipher),
        }
    }

    /// Fetch and decrypt a credential
    ///
    /// Returns `Ok(None)` when the record is absent, partial (empty secret or
    /// model id), or cannot be decrypted. Backend failures are returned as
    /// errors so callers can tell "not configured" from "store unavailable".
    pub async fn get_by_name(&self, name: &str) -> AppResult<Option<ResolvedCredential>> {
        let Some(record) = self.store.get(name).await? else {
            tracing::debug!(credential = %name, "Credential not found");
            return Ok(None);
        };

        if !record.is_usable() {
            tracing::warn!(
                credential = %name,
                has_secret = !record.encrypted_secret.trim().is_empty(),
                has_model_id = !record.model_id.trim().is_empty(),
                "Credential record is incomplete, treating as not found"
            );
            return Ok(None);
        }

        match self.cipher.decrypt(&record.encrypted_secret) {
            Ok(secret) => Ok(Some(ResolvedCredential {
                name: record.name,
                model_id: record.model_id,
                secret,
            })),
            Err(e) => {
                tracing::warn!(
                    credential = %name,
                    error = %e,
                    "Failed to decrypt credential, treating as not found"
                );
                Ok(None)
            }
        }
    }

    /// Encrypt and store a credential, creating or replacing it
    ///
    /// Name, secret and model id are trimmed; the model id is otherwise kept
    /// exactly as given. On update the original `created_at`/`created_by`
    /// are preserved.
    pub async fn save(
        &self,
        name: &str,
        secret: &str,
        model_id: &str,
        created_by: &str,
    ) -> AppResult<UpsertOutcome> {
        let name = name.trim();
        let secret = secret.trim();
        let model_id = model_id.trim();

        if name.is_empty() {
            return Err(AppError::Validation("credential name is required".to_string()));
        }
        if secret.is_empty() {
            return Err(AppError::Validation("secret is required".to_string()));
        }
        if model_id.is_empty() {
            return Err(AppError::Validation("model_id is required".to_string()));
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let (created_at, created_by) = match self.store.get(name).await? {
            Some(existing) => (existing.created_at, existing.created_by),
            None => (now.clone(), created_by.to_string()),
        };

        let record = CredentialRecord {
            name: name.to_string(),
            encrypted_secret: self.cipher.encrypt(secret)?,
            model_id: model_id.to_string(),
            created_at,
            updated_at: now,
            created_by,
        };

        let outcome = self.store.upsert(record).await?;
        tracing::info!(
            credential = %name,
            model_id = %model_id,
            outcome = ?outcome,
            "Saved credential"
        );
        Ok(outcome)
    }

    /// Remove a credential; `false` when it did not exist
    pub async fn delete(&self, name: &str) -> AppResult<bool> {
        let deleted = self.store.delete(name.trim()).await?;
        if deleted {
            tracing::info!(credential = %name, "Deleted credential");
        } else {
            tracing::warn!(credential = %name, "Credential not found for deletion");
        }
        Ok(deleted)
    }

    /// Metadata of every stored credential, secrets omitted
    pub async fn summaries(&self) -> AppResult<Vec<CredentialSummary>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(CredentialRecord::summary)
            .collect())
    }

    /// Probe the backing store
    pub async fn verify(&self) -> StoreHealth {
        match self.store.list().await {
            Ok(records) => StoreHealth {
                healthy: true,
                message: "Credential store is healthy".to_string(),
                key_count: records.len(),
            },
            Err(e) => StoreHealth {
                healthy: false,
                message: format!("Credential store error: {}", e),
                key_count: 0,
            },
        }
    }
}
