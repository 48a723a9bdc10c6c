//! Error types for devil-router
//!
//! All errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Neither the requested credential nor the default category's credential
    /// could be resolved. The only hard routing failure.
    #[error("{}", credential_missing_message(.credential, .fallback.as_deref()))]
    CredentialMissing {
        credential: String,
        fallback: Option<String>,
    },

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn credential_missing_message(credential: &str, fallback: Option<&str>) -> String {
    match fallback {
        Some(fallback) => format!(
            "No API key configured for '{}' or fallback '{}'",
            credential, fallback
        ),
        None => format!("No API key configured for '{}'", credential),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::CredentialMissing { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{}. Please configure API keys in the admin panel.", self),
            ),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::CredentialStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            // Cipher details never leave the process
            Self::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process credential".to_string(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_validation_error_creates() {
        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Invalid request: invalid input");
    }

    #[test]
    fn test_credential_missing_names_both_credentials() {
        let err = AppError::CredentialMissing {
            credential: "debugging_api_key".to_string(),
            fallback: Some("main_brain_key".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No API key configured for 'debugging_api_key' or fallback 'main_brain_key'"
        );
    }

    #[test]
    fn test_credential_missing_without_fallback() {
        let err = AppError::CredentialMissing {
            credential: "main_brain_key".to_string(),
            fallback: None,
        };
        assert_eq!(err.to_string(), "No API key configured for 'main_brain_key'");
    }

    #[test]
    fn test_validation_error_response_status() {
        let err = AppError::Validation("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_credential_missing_response_status() {
        let err = AppError::CredentialMissing {
            credential: "coding_key".to_string(),
            fallback: None,
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unauthorized_response_status() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_found_response_status() {
        let response = AppError::NotFound("credential 'x'".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_crypto_error_response_status() {
        let response = AppError::Crypto("bad tag".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_error_response_status() {
        let err = AppError::Internal("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
