//! Integration tests for credential resolution and fallback

use devil_router::config::RoutingConfig;
use devil_router::credentials::{MemoryStore, SecretCipher, Vault};
use devil_router::error::AppError;
use devil_router::router::{CategoryRouter, Fallback, RouteMode, RoutingTable};
use std::sync::Arc;

async fn router(keys: &[(&str, &str)]) -> CategoryRouter {
    let vault = Vault::new(
        Arc::new(MemoryStore::new()),
        SecretCipher::from_passphrase("fallback-tests").unwrap(),
    );
    for (name, model) in keys {
        vault
            .save(name, &format!("secret-{}", name), model, "admin")
            .await
            .unwrap();
    }
    let table = RoutingTable::from_config(&RoutingConfig::default()).unwrap();
    CategoryRouter::new(Arc::new(table), vault)
}

#[tokio::test]
async fn test_every_stock_category_routes_to_its_own_credential() {
    let keys = [
        ("debugging_api_key", "m-debugging"),
        ("canvas_notes_api_key", "m-canvas"),
        ("uiux_mockup_api_key", "m-uiux"),
        ("image_generation_api_key", "m-image"),
        ("fast_api_key", "m-fast"),
        ("coding_key", "m-coding"),
        ("game_dev_key", "m-game"),
        ("main_brain_key", "m-main"),
    ];
    let router = router(&keys).await;

    for rule in router.table().rules() {
        let result = router.route_by_category(rule.name()).await.unwrap();
        assert_eq!(result.category, rule.name());
        assert_eq!(result.key_type, rule.credential());
        assert_eq!(result.api_key, format!("secret-{}", rule.credential()));
        assert_eq!(result.fallback, None);
    }
}

#[tokio::test]
async fn test_auto_missing_credential_falls_back_with_reason() {
    let router = router(&[("main_brain_key", "nousresearch/hermes-3")]).await;
    let result = router
        .route_by_message("Please help me refactor this python class into smaller pieces")
        .await
        .unwrap();

    assert_eq!(result.category, "main_brain");
    assert_eq!(result.key_type, "main_brain_key");
    assert_eq!(result.mode, RouteMode::Auto);
    assert_eq!(result.fallback, Some(Fallback::CredentialNotFound));
    assert_eq!(
        result.reason,
        "Auto-detected: coding, but key not found for coding_key. Using fallback main_brain_key"
    );
}

#[tokio::test]
async fn test_invalid_category_reason() {
    let router = router(&[("main_brain_key", "nousresearch/hermes-3")]).await;
    let result = tokio_test::assert_ok!(router.route_by_category("Coding").await);
    assert_eq!(
        result.reason,
        "Invalid category 'Coding', using fallback main_brain"
    );
    assert_eq!(result.fallback, Some(Fallback::InvalidCategory));
}

#[tokio::test]
async fn test_hard_failure_names_requested_and_fallback_credentials() {
    let router = router(&[]).await;
    let err = tokio_test::assert_err!(
        router
            .route_by_message("wireframe for the onboarding flow of my mobile app")
            .await
    );
    match err {
        AppError::CredentialMissing {
            credential,
            fallback,
        } => {
            assert_eq!(credential, "uiux_mockup_api_key");
            assert_eq!(fallback.as_deref(), Some("main_brain_key"));
        }
        other => panic!("expected CredentialMissing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deleting_credential_switches_to_fallback() {
    let router = router(&[
        ("image_generation_api_key", "black-forest-labs/flux"),
        ("main_brain_key", "nousresearch/hermes-3"),
    ])
    .await;
    let before = router.route_by_category("image_generation").await.unwrap();
    assert_eq!(before.model, "black-forest-labs/flux");

    assert!(router.vault().delete("image_generation_api_key").await.unwrap());
    let after = router.route_by_category("image_generation").await.unwrap();
    assert_eq!(after.category, "main_brain");
    assert_eq!(after.fallback, Some(Fallback::CredentialNotFound));
}

#[tokio::test]
async fn test_concurrent_routing_shares_router() {
    let router = Arc::new(router(&[("main_brain_key", "nousresearch/hermes-3")]).await);
    let mut handles = Vec::new();
    for i in 0..32 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            router
                .route_by_message(&format!("message number {} with nothing special", i))
                .await
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.key_type, "main_brain_key");
    }
}
