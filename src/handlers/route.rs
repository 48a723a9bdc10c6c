//! Routing and classification endpoints
//!
//! `POST /route` resolves a category to a credential and model id.
//! `POST /classify` only runs the classifier and never touches the vault.

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::router::{Fallback, RouteMode, RoutingResult};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

/// Maximum accepted message length in characters
const MAX_MESSAGE_LENGTH: usize = 100_000;

/// Body of `POST /route`
///
/// Exactly one of `message` and `category` must be present; this is enforced
/// during deserialization so an invalid request never reaches the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequest {
    Message(String),
    Category(String),
}

impl<'de> Deserialize<'de> for RouteRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RawRouteRequest {
            message: Option<String>,
            category: Option<String>,
        }

        let raw = RawRouteRequest::deserialize(deserializer)?;
        match (raw.message, raw.category) {
            (Some(message), None) => {
                check_length(&message).map_err(<D::Error as serde::de::Error>::custom)?;
                Ok(Self::Message(message))
            }
            (None, Some(category)) => Ok(Self::Category(category)),
            (Some(_), Some(_)) => Err(serde::de::Error::custom(
                "provide either message or category, not both",
            )),
            (None, None) => Err(serde::de::Error::custom(
                "one of message or category is required",
            )),
        }
    }
}

/// Body of `POST /classify`
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    message: String,
}

impl<'de> Deserialize<'de> for ClassifyRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawClassifyRequest {
            message: String,
        }

        let raw = RawClassifyRequest::deserialize(deserializer)?;
        check_length(&raw.message).map_err(<D::Error as serde::de::Error>::custom)?;
        Ok(Self {
            message: raw.message,
        })
    }
}

fn check_length(message: &str) -> Result<(), String> {
    let chars = message.chars().count();
    if chars > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "message exceeds maximum length of {} characters (got {})",
            MAX_MESSAGE_LENGTH, chars
        ));
    }
    Ok(())
}

/// Public view of a routing decision; the decrypted secret is left out
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub category: String,
    pub key_type: String,
    pub model: String,
    pub reason: String,
    pub mode: RouteMode,
    pub fallback: Option<Fallback>,
}

impl From<RoutingResult> for RouteResponse {
    fn from(result: RoutingResult) -> Self {
        Self {
            category: result.category,
            key_type: result.key_type,
            model: result.model,
            reason: result.reason,
            mode: result.mode,
            fallback: result.fallback,
        }
    }
}

pub async fn route(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RouteRequest>,
) -> AppResult<Json<RouteResponse>> {
    let started = Instant::now();
    let (mode, outcome) = match &request {
        RouteRequest::Message(message) => {
            (RouteMode::Auto, state.router().route_by_message(message).await)
        }
        RouteRequest::Category(category) => {
            (RouteMode::Forced, state.router().route_by_category(category).await)
        }
    };
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    let metrics = state.metrics();
    if let Err(e) = metrics.record_routing_duration(mode, duration_ms) {
        tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if matches!(e, AppError::CredentialMissing { .. }) {
                metrics.credential_missing();
            }
            tracing::warn!(
                request_id = %request_id,
                mode = mode.as_str(),
                error = %e,
                "Routing failed"
            );
            return Err(e);
        }
    };

    if let Err(e) = metrics.record_route(&result.category, result.mode, result.fallback) {
        tracing::error!(request_id = %request_id, error = %e, "Metrics recording failed (non-fatal)");
    }

    tracing::info!(
        request_id = %request_id,
        category = %result.category,
        key_type = %result.key_type,
        model = %result.model,
        mode = result.mode.as_str(),
        fallback = result.fallback.map(|f| f.as_str()),
        routing_duration_ms = duration_ms,
        "Routing decision made"
    );

    Ok(Json(result.into()))
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    pub category: String,
    /// `{"kind": "trigger", "trigger": "..."}`, `{"kind": "short_message"}`, ...
    pub basis: serde_json::Value,
}

pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> AppResult<Json<ClassifyResponse>> {
    let classification = state.router().classifier().classify(&request.message);
    let basis = serde_json::to_value(classification.basis)
        .map_err(|e| AppError::Internal(format!("failed to encode match basis: {}", e)))?;

    Ok(Json(ClassifyResponse {
        category: classification.category().to_string(),
        basis,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_request_accepts_message() {
        let request: RouteRequest = serde_json::from_str(r#"{"message": "fix this bug"}"#).unwrap();
        assert_eq!(request, RouteRequest::Message("fix this bug".to_string()));
    }

    #[test]
    fn test_route_request_accepts_category() {
        let request: RouteRequest = serde_json::from_str(r#"{"category": "coding"}"#).unwrap();
        assert_eq!(request, RouteRequest::Category("coding".to_string()));
    }

    #[test]
    fn test_route_request_rejects_both_or_neither() {
        let both = serde_json::from_str::<RouteRequest>(r#"{"message": "x", "category": "fast"}"#);
        assert!(both.unwrap_err().to_string().contains("not both"));

        let neither = serde_json::from_str::<RouteRequest>("{}");
        assert!(neither.unwrap_err().to_string().contains("required"));
    }

    #[test]
    fn test_empty_message_is_allowed() {
        let request: RouteRequest = serde_json::from_str(r#"{"message": ""}"#).unwrap();
        assert_eq!(request, RouteRequest::Message(String::new()));
    }

    #[test]
    fn test_oversized_message_rejected() {
        let body = serde_json::json!({ "message": "a".repeat(MAX_MESSAGE_LENGTH + 1) });
        assert!(serde_json::from_value::<RouteRequest>(body.clone()).is_err());
        assert!(serde_json::from_value::<ClassifyRequest>(body).is_err());
    }

    #[test]
    fn test_route_response_drops_secret() {
        let response = RouteResponse::from(RoutingResult {
            category: "coding".to_string(),
            key_type: "coding_key".to_string(),
            model: "qwen/qwen3-coder".to_string(),
            api_key: "sk-or-very-secret".to_string(),
            reason: "User selected: coding".to_string(),
            mode: RouteMode::Forced,
            fallback: None,
        });
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("sk-or-very-secret"));
        assert!(json.contains("\"mode\":\"forced\""));
        assert!(json.contains("\"fallback\":null"));
    }
}
