//! HTTP request handlers for devil-router

use crate::config::Config;
use crate::credentials::Vault;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::router::{CategoryRouter, RoutingTable};
use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod admin;
pub mod categories;
pub mod health;
pub mod metrics;
pub mod route;

/// Application state shared across all handlers
///
/// Every field is Arc'd so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: Arc<CategoryRouter>,
    metrics: Arc<Metrics>,
    admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Build the routing table from `config` and attach `vault`
    ///
    /// The admin token is read from the environment variable named in
    /// `[admin]`; use [`with_admin_token`](Self::with_admin_token) to override.
    pub fn new(config: Arc<Config>, vault: Vault) -> AppResult<Self> {
        let table = Arc::new(RoutingTable::from_config(&config.routing)?);
        let router = Arc::new(CategoryRouter::new(table, vault));
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("failed to register metrics: {}", e)))?;
        let admin_token = config.admin.token().map(Arc::from);

        Ok(Self {
            config,
            router,
            metrics: Arc::new(metrics),
            admin_token,
        })
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.trim().is_empty()).map(Arc::from);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &CategoryRouter {
        &self.router
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn vault(&self) -> &Vault {
        self.router.vault()
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}

/// Assemble every route plus the request-id, tracing and timeout layers
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config().server.request_timeout_seconds);

    let admin = Router::new()
        .route("/credentials", get(admin::list))
        .route(
            "/credentials/{name}",
            put(admin::upsert).delete(admin::remove),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .route("/health", get(health::handler))
        .route("/classify", post(route::classify))
        .route("/route", post(route::route))
        .route("/categories", get(categories::handler))
        .route("/metrics", get(metrics::handler))
        .nest("/admin", admin)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::credentials::{MemoryStore, SecretCipher};

    pub(crate) const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000
request_timeout_seconds = 30

[credentials]
backend = "memory"
"#;

    pub(crate) async fn state_with(keys: &[(&str, &str)]) -> AppState {
        let config: Config = TEST_CONFIG.parse().expect("should parse test config");
        let cipher = SecretCipher::from_passphrase("handler-tests").unwrap();
        let vault = Vault::new(Arc::new(MemoryStore::new()), cipher);
        for (name, model) in keys {
            vault
                .save(name, &format!("sk-or-{}", name), model, "admin")
                .await
                .unwrap();
        }
        AppState::new(Arc::new(config), vault)
            .expect("should create AppState")
            .with_admin_token(None)
    }
}
