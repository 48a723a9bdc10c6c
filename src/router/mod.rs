//! Routing logic for devil-router
//!
//! Classifies a message into a category, then resolves the category to the
//! credential and model id that should serve it.

pub mod category_router;
pub mod classifier;
pub mod table;

pub use category_router::{CategoryAvailability, CategoryRouter};
pub use classifier::{CategoryClassifier, Classification, MatchBasis};
pub use table::{CategoryRule, RoutingTable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority group a category's triggers are scanned in
///
/// Stages are always evaluated in declaration order of this enum,
/// independent of the order categories appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Error and bug reports
    Urgent,
    /// Notes, documents, presentations
    Structured,
    /// UI and visual layout work
    Layout,
    /// Image, logo and icon generation
    Generative,
    /// Fast category, reachable only through the length-gated fast path
    Quick,
    /// Everything else, scanned in declaration order
    General,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Urgent,
        Stage::Structured,
        Stage::Layout,
        Stage::Generative,
        Stage::Quick,
        Stage::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Structured => "structured",
            Self::Layout => "layout",
            Self::Generative => "generative",
            Self::Quick => "quick",
            Self::General => "general",
        }
    }
}

/// How the category of a routing request was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Caller named the category explicitly
    Forced,
    /// Category was detected from the message text
    Auto,
}

impl RouteMode {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Auto => "auto",
        }
    }
}

/// Why the default category was substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Requested category is not in the table
    InvalidCategory,
    /// Category was valid but its credential is absent or unusable
    CredentialNotFound,
}

impl Fallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCategory => "invalid_category",
            Self::CredentialNotFound => "credential_not_found",
        }
    }
}

/// Outcome of a successful routing call
///
/// Lives for one request. `api_key` is meant for exactly one outbound call
/// and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RoutingResult {
    /// Resolved category, after any fallback substitution
    pub category: String,
    /// Credential name actually used
    pub key_type: String,
    /// Model id read verbatim from the credential record
    pub model: String,
    /// Decrypted secret
    pub api_key: String,
    /// Human-readable trace of the decision
    pub reason: String,
    pub mode: RouteMode,
    pub fallback: Option<Fallback>,
}

impl fmt::Debug for RoutingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingResult")
            .field("category", &self.category)
            .field("key_type", &self.key_type)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("reason", &self.reason)
            .field("mode", &self.mode)
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_fixed() {
        let mut shuffled = vec![
            Stage::General,
            Stage::Quick,
            Stage::Urgent,
            Stage::Generative,
            Stage::Layout,
            Stage::Structured,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Stage::ALL.to_vec());
    }

    #[test]
    fn test_stage_serde() {
        assert_eq!(
            serde_json::from_str::<Stage>(r#""urgent""#).unwrap(),
            Stage::Urgent
        );
        assert_eq!(
            serde_json::from_str::<Stage>(r#""generative""#).unwrap(),
            Stage::Generative
        );
        assert!(serde_json::from_str::<Stage>(r#""Urgent""#).is_err());
        for stage in Stage::ALL {
            assert_eq!(
                serde_json::to_string(&stage).unwrap(),
                format!("\"{}\"", stage.as_str())
            );
        }
    }

    #[test]
    fn test_route_mode_as_str() {
        assert_eq!(RouteMode::Forced.as_str(), "forced");
        assert_eq!(RouteMode::Auto.as_str(), "auto");
        assert_eq!(
            serde_json::to_string(&RouteMode::Auto).unwrap(),
            r#""auto""#
        );
    }

    #[test]
    fn test_fallback_serde_matches_as_str() {
        for fallback in [Fallback::InvalidCategory, Fallback::CredentialNotFound] {
            assert_eq!(
                serde_json::to_string(&fallback).unwrap(),
                format!("\"{}\"", fallback.as_str())
            );
        }
    }

    #[test]
    fn test_routing_result_debug_redacts_api_key() {
        let result = RoutingResult {
            category: "coding".to_string(),
            key_type: "coding_key".to_string(),
            model: "qwen/qwen3-coder".to_string(),
            api_key: "sk-or-super-secret".to_string(),
            reason: "Auto-detected: coding".to_string(),
            mode: RouteMode::Auto,
            fallback: None,
        };
        let debug = format!("{:?}", result);
        assert!(!debug.contains("sk-or-super-secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("qwen/qwen3-coder"));
    }
}
