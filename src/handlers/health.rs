//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// "operational" when the credential store answered, "degraded" otherwise
    pub credential_store: &'static str,
    pub credential_count: usize,
}

/// Always 200 while the process serves requests; a failing credential store
/// shows up as `credential_store: "degraded"` rather than as an error status.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = state.vault().verify().await;
    if !health.healthy {
        tracing::warn!(message = %health.message, "Credential store health probe failed");
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            credential_store: if health.healthy {
                "operational"
            } else {
                "degraded"
            },
            credential_count: health.key_count,
        }),
    )
}
