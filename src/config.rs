//! Configuration management for devil-router
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section except `[server]` has defaults; an omitted `[routing]`
//! section yields the stock category table.

use crate::error::{AppError, AppResult};
use crate::router::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Category table and classifier thresholds
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RoutingConfig {
    /// Category used when nothing matches and as the credential fallback
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Category returned by the short-message fast path (None disables it)
    #[serde(default = "default_fast_category")]
    pub fast_category: Option<String>,
    /// Messages shorter than this (in characters) always take the fast path
    #[serde(default = "default_short_message_chars")]
    pub short_message_chars: usize,
    /// Messages shorter than this take the fast path when a quick trigger matches
    #[serde(default = "default_quick_message_chars")]
    pub quick_message_chars: usize,
    #[serde(default = "stock_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            fast_category: default_fast_category(),
            short_message_chars: default_short_message_chars(),
            quick_message_chars: default_quick_message_chars(),
            categories: stock_categories(),
        }
    }
}

fn default_category() -> String {
    "main_brain".to_string()
}

fn default_fast_category() -> Option<String> {
    Some("fast".to_string())
}

fn default_short_message_chars() -> usize {
    30
}

fn default_quick_message_chars() -> usize {
    100
}

/// One routable category
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CategoryConfig {
    pub name: String,
    /// Name of the credential record holding this category's key and model id
    pub credential: String,
    pub stage: Stage,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl CategoryConfig {
    fn stock(
        name: &str,
        credential: &str,
        stage: Stage,
        description: &str,
        triggers: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            credential: credential.to_string(),
            stage,
            description: description.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The category table shipped with the chat application.
///
/// Declaration order matters only within a stage.
pub fn stock_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::stock(
            "debugging",
            "debugging_api_key",
            Stage::Urgent,
            "Finding and fixing bugs",
            &[
                "bug",
                "error",
                "exception",
                "stack trace",
                "traceback",
                "crash",
                "broken",
                "not working",
                "doesn't work",
                "won't work",
                "fails",
                "failing",
                "typeerror",
                "undefined",
                "segfault",
                "debug",
                "troubleshoot",
                "fix this",
                "help me fix",
                "what's wrong",
            ],
        ),
        CategoryConfig::stock(
            "canvas_notes",
            "canvas_notes_api_key",
            Stage::Structured,
            "Presentations, notes and documents",
            &[
                "presentation",
                "powerpoint",
                "ppt",
                "slides",
                "slide deck",
                "pitch deck",
                "keynote",
                "notes",
                "outline",
                "summary",
                "report",
                "essay",
                "article",
                "blog",
                "draft",
                "thesis",
                "cheat sheet",
            ],
        ),
        CategoryConfig::stock(
            "uiux_mockup",
            "uiux_mockup_api_key",
            Stage::Layout,
            "Interface design and mockups",
            &[
                "mockup",
                "wireframe",
                "prototype",
                "landing page",
                "ui design",
                "ux design",
                "ui/ux",
                "user interface",
                "user experience",
                "layout",
                "color scheme",
                "typography",
                "figma",
                "responsive",
            ],
        ),
        CategoryConfig::stock(
            "image_generation",
            "image_generation_api_key",
            Stage::Generative,
            "Image, logo and icon generation",
            &[
                "generate an image",
                "generate image",
                "create an image",
                "create image",
                "make an image",
                "image of",
                "picture of",
                "photo of",
                "draw",
                "illustration",
                "artwork",
                "logo",
                "icon",
                "wallpaper",
                "text to image",
                "ai art",
            ],
        ),
        CategoryConfig::stock(
            "fast",
            "fast_api_key",
            Stage::Quick,
            "Quick answers for short everyday questions",
            &[
                "quick",
                "brief",
                "short",
                "summarize",
                "tldr",
                "what is",
                "what are",
                "who is",
                "define",
                "simple answer",
                "how do i",
            ],
        ),
        CategoryConfig::stock(
            "coding",
            "coding_key",
            Stage::General,
            "Coding and full-stack development",
            &[
                "code",
                "function",
                "class",
                "variable",
                "algorithm",
                "script",
                "program",
                "python",
                "javascript",
                "typescript",
                "java",
                "c++",
                "rust",
                "golang",
                "react",
                "node",
                "api",
                "sql",
                "database",
                "frontend",
                "backend",
                "full stack",
                "fullstack",
                "implement",
                "compile",
                "refactor",
                "regex",
            ],
        ),
        CategoryConfig::stock(
            "game_dev",
            "game_dev_key",
            Stage::General,
            "Game development and interactive experiences",
            &[
                "game",
                "unity",
                "unreal",
                "godot",
                "sprite",
                "gameplay",
                "level design",
                "npc",
                "shader",
                "collision",
                "player movement",
            ],
        ),
        CategoryConfig::stock(
            "main_brain",
            "main_brain_key",
            Stage::General,
            "Advanced reasoning and complex problem solving",
            &[
                "analyze",
                "analyse",
                "reason",
                "philosophy",
                "theory",
                "research",
                "compare",
                "contrast",
                "evaluate",
                "critique",
                "in depth",
                "comprehensive",
                "step by step",
            ],
        ),
    ]
}

impl RoutingConfig {
    /// Look up a category by name
    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Validate the category table
    pub fn validate(&self) -> AppResult<()> {
        if self.categories.is_empty() {
            return Err(AppError::Config(
                "Configuration error: routing.categories is empty. \
                At least the default category must be declared."
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.is_empty()
                || !category
                    .name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(AppError::Config(format!(
                    "Configuration error: category name '{}' is invalid. \
                    Names must be non-empty and use only a-z, 0-9 and '_'.",
                    category.name
                )));
            }

            if !seen.insert(category.name.as_str()) {
                return Err(AppError::Config(format!(
                    "Configuration error: category '{}' is declared more than once",
                    category.name
                )));
            }

            if category.credential.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Configuration error: category '{}' has an empty credential name",
                    category.name
                )));
            }

            if let Some(position) = category.triggers.iter().position(|t| t.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "Configuration error: category '{}' has a blank trigger at position {}",
                    category.name, position
                )));
            }

            if category.stage == Stage::Quick
                && self.fast_category.as_deref() != Some(category.name.as_str())
            {
                return Err(AppError::Config(format!(
                    "Configuration error: category '{}' uses stage 'quick', which is reserved \
                    for routing.fast_category ({}).",
                    category.name,
                    self.fast_category.as_deref().unwrap_or("<unset>")
                )));
            }
        }

        if self.category(&self.default_category).is_none() {
            return Err(AppError::Config(format!(
                "Configuration error: routing.default_category '{}' is not a declared category. \
                Declared: {}",
                self.default_category,
                self.category_names().join(", ")
            )));
        }

        if let Some(fast) = &self.fast_category {
            match self.category(fast) {
                None => {
                    return Err(AppError::Config(format!(
                        "Configuration error: routing.fast_category '{}' is not a declared category",
                        fast
                    )));
                }
                Some(category) if category.stage != Stage::Quick => {
                    return Err(AppError::Config(format!(
                        "Configuration error: routing.fast_category '{}' must use stage 'quick', \
                        found '{}'",
                        fast,
                        category.stage.as_str()
                    )));
                }
                Some(_) => {}
            }
        }

        if self.short_message_chars > self.quick_message_chars {
            return Err(AppError::Config(format!(
                "Configuration error: routing.short_message_chars ({}) cannot exceed \
                routing.quick_message_chars ({})",
                self.short_message_chars, self.quick_message_chars
            )));
        }

        Ok(())
    }

    fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Credential persistence backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file on local disk (survives restarts)
    #[default]
    File,
    /// Process memory only (tests and throwaway deployments)
    Memory,
}

/// Credential vault configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
    /// Environment variable holding the encryption passphrase
    #[serde(default = "default_encryption_key_env")]
    pub encryption_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_credentials_path(),
            encryption_key_env: default_encryption_key_env(),
        }
    }
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_encryption_key_env() -> String {
    "DEVIL_ENCRYPTION_KEY".to_string()
}

impl CredentialsConfig {
    /// Read the encryption passphrase from the configured environment variable
    pub fn encryption_passphrase(&self) -> AppResult<String> {
        match std::env::var(&self.encryption_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::Config(format!(
                "Environment variable {} must hold the credential encryption passphrase",
                self.encryption_key_env
            ))),
        }
    }
}

/// Admin surface configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    /// Environment variable holding the admin bearer token.
    /// Admin routes answer 404 when the variable is unset.
    #[serde(default = "default_admin_token_env")]
    pub token_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token_env: default_admin_token_env(),
        }
    }
}

fn default_admin_token_env() -> String {
    "DEVIL_ADMIN_TOKEN".to_string()
}

impl AdminConfig {
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when
    /// building a Config by other means.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "Configuration error: request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > 300 {
            return Err(AppError::Config(format!(
                "Configuration error: request_timeout_seconds cannot exceed 300 seconds (5 minutes), got {}",
                self.server.request_timeout_seconds
            )));
        }

        self.routing.validate()?;

        if self.credentials.backend == StoreBackend::File
            && self.credentials.path.as_os_str().is_empty()
        {
            return Err(AppError::Config(
                "Configuration error: credentials.path must be set for the file backend"
                    .to_string(),
            ));
        }
        if self.credentials.encryption_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "Configuration error: credentials.encryption_key_env cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
