//! Category to credential resolution
//!
//! Resolution takes at most two vault reads: the category's own credential,
//! then the default category's credential. There is no deeper recursion.

use super::classifier::{CategoryClassifier, Classification};
use super::table::{CategoryRule, RoutingTable};
use super::{Fallback, RouteMode, RoutingResult, Stage};
use crate::credentials::{ResolvedCredential, Vault};
use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;

/// Whether a category currently has a usable credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAvailability {
    pub category: String,
    pub credential: String,
    pub stage: Stage,
    pub description: String,
    /// Model id of the stored credential, when one is usable
    pub model: Option<String>,
    pub has_key: bool,
}

/// Resolves categories (explicit or detected) to a credential and model id
#[derive(Debug, Clone)]
pub struct CategoryRouter {
    classifier: CategoryClassifier,
    vault: Vault,
}

impl CategoryRouter {
    pub fn new(table: Arc<RoutingTable>, vault: Vault) -> Self {
        Self {
            classifier: CategoryClassifier::new(table),
            vault,
        }
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn table(&self) -> &RoutingTable {
        self.classifier.table()
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Route to an explicitly requested category
    ///
    /// An unknown category is replaced by the default category rather than
    /// rejected.
    ///
    /// # Errors
    /// `AppError::CredentialMissing` when neither the category's credential
    /// nor the default credential resolves; store failures pass through.
    pub async fn route_by_category(&self, category: &str) -> AppResult<RoutingResult> {
        let table = self.table();
        match table.get(category) {
            Some(rule) => {
                self.resolve(rule, RouteMode::Forced, format!("User selected: {}", rule.name()))
                    .await
            }
            None => {
                let default = table.default_rule();
                tracing::warn!(
                    requested_category = %category,
                    fallback_category = %default.name(),
                    "Invalid category requested, using fallback"
                );
                let credential = self.lookup(default, None).await?;
                Ok(RoutingResult {
                    category: default.name().to_string(),
                    key_type: credential.name,
                    model: credential.model_id,
                    api_key: credential.secret,
                    reason: format!(
                        "Invalid category '{}', using fallback {}",
                        category,
                        default.name()
                    ),
                    mode: RouteMode::Forced,
                    fallback: Some(Fallback::InvalidCategory),
                })
            }
        }
    }

    /// Classify a message, then route to the detected category
    ///
    /// # Errors
    /// Same as [`route_by_category`](Self::route_by_category).
    pub async fn route_by_message(&self, message: &str) -> AppResult<RoutingResult> {
        let Classification { rule, basis } = self.classifier.classify(message);
        tracing::debug!(
            category = %rule.name(),
            basis = %basis,
            message_chars = message.chars().count(),
            "Message classified"
        );
        self.resolve(rule, RouteMode::Auto, format!("Auto-detected: {}", rule.name()))
            .await
    }

    async fn resolve(
        &self,
        rule: &CategoryRule,
        mode: RouteMode,
        reason: String,
    ) -> AppResult<RoutingResult> {
        if let Some(credential) = self.vault.get_by_name(rule.credential()).await? {
            return Ok(RoutingResult {
                category: rule.name().to_string(),
                key_type: credential.name,
                model: credential.model_id,
                api_key: credential.secret,
                reason,
                mode,
                fallback: None,
            });
        }

        let default = self.table().default_rule();
        if default.credential() == rule.credential() {
            // Already on the default credential; nothing left to fall back to
            return Err(AppError::CredentialMissing {
                credential: rule.credential().to_string(),
                fallback: None,
            });
        }

        let credential = self.lookup(default, Some(rule)).await?;
        tracing::warn!(
            category = %rule.name(),
            credential = %rule.credential(),
            fallback_credential = %default.credential(),
            mode = mode.as_str(),
            "Credential not found, using fallback"
        );

        let reason = match mode {
            RouteMode::Forced => format!(
                "Key not found for {}, using fallback {}",
                rule.credential(),
                default.credential()
            ),
            RouteMode::Auto => format!(
                "Auto-detected: {}, but key not found for {}. Using fallback {}",
                rule.name(),
                rule.credential(),
                default.credential()
            ),
        };

        Ok(RoutingResult {
            category: default.name().to_string(),
            key_type: credential.name,
            model: credential.model_id,
            api_key: credential.secret,
            reason,
            mode,
            fallback: Some(Fallback::CredentialNotFound),
        })
    }

    /// Every category in scan order with its credential status
    ///
    /// Secrets are decrypted to prove usability but never returned.
    pub async fn availability(&self) -> AppResult<Vec<CategoryAvailability>> {
        let mut out = Vec::with_capacity(self.table().rules().len());
        for rule in self.table().rules() {
            let model = self
                .vault
                .get_by_name(rule.credential())
                .await?
                .map(|credential| credential.model_id);
            out.push(CategoryAvailability {
                category: rule.name().to_string(),
                credential: rule.credential().to_string(),
                stage: rule.stage(),
                description: rule.description().to_string(),
                has_key: model.is_some(),
                model,
            });
        }
        Ok(out)
    }

    /// Look up the default credential, naming `requested` in the error if set
    async fn lookup(
        &self,
        default: &CategoryRule,
        requested: Option<&CategoryRule>,
    ) -> AppResult<ResolvedCredential> {
        self.vault
            .get_by_name(default.credential())
            .await?
            .ok_or_else(|| match requested {
                Some(rule) => AppError::CredentialMissing {
                    credential: rule.credential().to_string(),
                    fallback: Some(default.credential().to_string()),
                },
                None => AppError::CredentialMissing {
                    credential: default.credential().to_string(),
                    fallback: None,
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::credentials::{MemoryStore, SecretCipher};

    async fn router_with(keys: &[(&str, &str)]) -> CategoryRouter {
        let store = Arc::new(MemoryStore::new());
        let cipher = SecretCipher::from_passphrase("router-tests").unwrap();
        let vault = Vault::new(store, cipher);
        for (name, model) in keys {
            vault
                .save(name, &format!("sk-or-{}", name), model, "admin")
                .await
                .unwrap();
        }
        let table = RoutingTable::from_config(&RoutingConfig::default()).unwrap();
        CategoryRouter::new(Arc::new(table), vault)
    }

    #[tokio::test]
    async fn test_forced_route_uses_category_credential() {
        let router = router_with(&[("coding_key", "qwen/qwen3-coder-480b-a35b")]).await;
        let result = router.route_by_category("coding").await.unwrap();
        assert_eq!(result.category, "coding");
        assert_eq!(result.key_type, "coding_key");
        assert_eq!(result.model, "qwen/qwen3-coder-480b-a35b");
        assert_eq!(result.api_key, "sk-or-coding_key");
        assert_eq!(result.reason, "User selected: coding");
        assert_eq!(result.mode, RouteMode::Forced);
        assert_eq!(result.fallback, None);
    }

    #[tokio::test]
    async fn test_invalid_category_falls_back_to_default() {
        let router = router_with(&[("main_brain_key", "nousresearch/hermes-3-llama-3.1-405b")]).await;
        let result = router
            .route_by_category("totally_bogus_category")
            .await
            .unwrap();
        assert_eq!(result.category, "main_brain");
        assert_eq!(result.key_type, "main_brain_key");
        assert!(result.reason.contains("Invalid category"));
        assert_eq!(result.fallback, Some(Fallback::InvalidCategory));
    }

    #[tokio::test]
    async fn test_invalid_category_without_default_key_fails() {
        let router = router_with(&[]).await;
        let err = router.route_by_category("bogus").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::CredentialMissing { ref credential, fallback: None } if credential == "main_brain_key"
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_uses_default_credential() {
        let router = router_with(&[("main_brain_key", "nousresearch/hermes-3")]).await;
        let result = router.route_by_category("debugging").await.unwrap();
        assert_eq!(result.category, "main_brain");
        assert_eq!(result.key_type, "main_brain_key");
        assert_eq!(result.model, "nousresearch/hermes-3");
        assert_eq!(
            result.reason,
            "Key not found for debugging_api_key, using fallback main_brain_key"
        );
        assert_eq!(result.fallback, Some(Fallback::CredentialNotFound));
    }

    #[tokio::test]
    async fn test_auto_route_fallback_reason_names_detected_category() {
        let router = router_with(&[("main_brain_key", "nousresearch/hermes-3")]).await;
        let result = router.route_by_message("hi").await.unwrap();
        assert_eq!(result.category, "main_brain");
        assert_eq!(result.mode, RouteMode::Auto);
        assert!(result.reason.starts_with("Auto-detected: fast, but key not found"));
    }

    #[tokio::test]
    async fn test_both_credentials_missing_is_hard_failure() {
        let router = router_with(&[("coding_key", "qwen/qwen3-coder")]).await;
        let err = router.route_by_category("debugging").await.unwrap_err();
        match err {
            AppError::CredentialMissing {
                credential,
                fallback,
            } => {
                assert_eq!(credential, "debugging_api_key");
                assert_eq!(fallback.as_deref(), Some("main_brain_key"));
            }
            other => panic!("expected CredentialMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_category_missing_does_not_look_up_twice() {
        let router = router_with(&[]).await;
        let err = router.route_by_category("main_brain").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::CredentialMissing { fallback: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_model_id_passes_through_unchanged() {
        let router = router_with(&[("fast_api_key", "vendor/model-x:free")]).await;
        let result = router.route_by_category("fast").await.unwrap();
        assert_eq!(result.model, "vendor/model-x:free");
    }

    #[tokio::test]
    async fn test_debugging_message_end_to_end() {
        let router = router_with(&[
            ("debugging_api_key", "tngtech/deepseek-r1t2-chimera"),
            ("main_brain_key", "nousresearch/hermes-3"),
        ])
        .await;
        let result = router
            .route_by_message("I'm getting a TypeError: undefined is not a function")
            .await
            .unwrap();
        assert_eq!(result.category, "debugging");
        assert_eq!(result.model, "tngtech/deepseek-r1t2-chimera");
        assert_eq!(result.reason, "Auto-detected: debugging");
    }

    #[tokio::test]
    async fn test_availability_reports_models_without_secrets() {
        let router = router_with(&[("canvas_notes_api_key", "google/gemini-2.5-flash")]).await;
        let listing = router.availability().await.unwrap();
        assert_eq!(listing.len(), 8);

        let canvas = listing
            .iter()
            .find(|entry| entry.category == "canvas_notes")
            .unwrap();
        assert!(canvas.has_key);
        assert_eq!(canvas.model.as_deref(), Some("google/gemini-2.5-flash"));
        assert_eq!(canvas.stage, Stage::Structured);

        let coding = listing.iter().find(|entry| entry.category == "coding").unwrap();
        assert!(!coding.has_key);
        assert_eq!(coding.model, None);
    }

    #[tokio::test]
    async fn test_model_change_is_visible_on_next_route() {
        let router = router_with(&[("coding_key", "qwen/qwen3-coder")]).await;
        router
            .vault()
            .save("coding_key", "sk-new", "qwen/qwen3-coder-next", "admin")
            .await
            .unwrap();
        let result = router.route_by_category("coding").await.unwrap();
        assert_eq!(result.model, "qwen/qwen3-coder-next");
        assert_eq!(result.api_key, "sk-new");
    }
}
