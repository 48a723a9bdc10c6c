//! Credential administration
//!
//! Guarded by a static bearer token. With no token configured the whole
//! `/admin` tree answers 404, as if it did not exist.

use crate::credentials::{CredentialSummary, UpsertOutcome};
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use axum::{
    Json,
    extract::{Path, Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

/// Recorded as `created_by` on credentials written through this API
const ADMIN_ACTOR: &str = "admin";

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let Some(expected) = state.admin_token() else {
        return Err(AppError::NotFound(request.uri().path().to_string()));
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            tracing::warn!(
                uri = %request.uri().path(),
                has_header = presented.is_some(),
                "Rejected admin request"
            );
            Err(AppError::Unauthorized)
        }
    }
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<CredentialSummary>>> {
    Ok(Json(state.vault().summaries().await?))
}

#[derive(Debug, Deserialize)]
pub struct UpsertCredential {
    pub secret: String,
    pub model_id: String,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub name: String,
    pub outcome: UpsertOutcome,
}

/// `201` when the credential is new, `200` when it replaced an existing one
pub async fn upsert(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<UpsertCredential>,
) -> AppResult<(StatusCode, Json<UpsertResponse>)> {
    let outcome = state
        .vault()
        .save(&name, &body.secret, &body.model_id, ADMIN_ACTOR)
        .await?;

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((
        status,
        Json(UpsertResponse {
            name: name.trim().to_string(),
            outcome,
        }),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    if state.vault().delete(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("credential '{}'", name)))
    }
}
