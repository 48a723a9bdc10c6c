//! Command-line interface for devil-router

use clap::{Args, Parser, Subcommand};

/// Category-aware credential and model router for a multi-model chat app
#[derive(Parser)]
#[command(name = "devil-router")]
#[command(version)]
#[command(about = "Category-aware credential and model router")]
#[command(
    long_about = "devil-router classifies chat messages into task categories and resolves \
    each category to an encrypted provider credential and the model id stored with it."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the category a message would be routed to
    Classify {
        /// Message text to classify
        message: String,
    },
    /// Manage stored credentials
    Credentials(CredentialsArgs),
}

#[derive(Args)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub action: CredentialsCommand,
}

#[derive(Subcommand)]
pub enum CredentialsCommand {
    /// List stored credentials (secrets are never shown)
    List,
    /// Create or replace a credential
    Set {
        /// Credential name, e.g. coding_key
        name: String,
        /// Model id to use with this credential, passed through verbatim
        #[arg(short, long)]
        model: String,
        /// Provider API key
        #[arg(short, long)]
        secret: String,
    },
    /// Delete a credential
    Delete {
        /// Credential name
        name: String,
    },
}

/// Generate template configuration content
///
/// The category table in the template is the stock table, so a freshly
/// generated file routes exactly like a config without `[routing]`.
pub fn generate_config_template() -> &'static str {
    r#"# devil-router configuration
#
# Secrets never live in this file. The credential encryption passphrase and
# the admin token are read from the environment variables named below.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"
port = 3000
# Per-request timeout in seconds (1-300)
request_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# CREDENTIALS
# ─────────────────────────────────────────────────────────────────────────────

[credentials]
# "file" persists to `path`; "memory" forgets everything on restart
backend = "file"
path = "credentials.json"
# Environment variable holding the AES-256-GCM passphrase (required)
encryption_key_env = "DEVIL_ENCRYPTION_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# ADMIN
# ─────────────────────────────────────────────────────────────────────────────

[admin]
# Environment variable holding the bearer token for /admin routes.
# When it is unset the admin routes respond 404.
token_env = "DEVIL_ADMIN_TOKEN"

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING
# ─────────────────────────────────────────────────────────────────────────────
#
# Categories are scanned by stage, in this fixed order:
#   urgent -> structured -> layout -> generative -> quick -> general
# Within a stage the declaration order below decides. Triggers are matched
# case-insensitively as substrings of the message.
#
# The quick stage is special: the fast category is chosen when the message is
# shorter than short_message_chars, or shorter than quick_message_chars and
# containing one of its triggers.

[routing]
# Used when nothing matches, and as the credential fallback
default_category = "main_brain"
fast_category = "fast"
short_message_chars = 30
quick_message_chars = 100

[[routing.categories]]
name = "debugging"
credential = "debugging_api_key"
stage = "urgent"
description = "Finding and fixing bugs"
triggers = [
    "bug", "error", "exception", "stack trace", "traceback", "crash", "broken",
    "not working", "doesn't work", "won't work", "fails", "failing",
    "typeerror", "undefined", "segfault", "debug", "troubleshoot", "fix this",
    "help me fix", "what's wrong",
]

[[routing.categories]]
name = "canvas_notes"
credential = "canvas_notes_api_key"
stage = "structured"
description = "Presentations, notes and documents"
triggers = [
    "presentation", "powerpoint", "ppt", "slides", "slide deck", "pitch deck",
    "keynote", "notes", "outline", "summary", "report", "essay", "article",
    "blog", "draft", "thesis", "cheat sheet",
]

[[routing.categories]]
name = "uiux_mockup"
credential = "uiux_mockup_api_key"
stage = "layout"
description = "Interface design and mockups"
triggers = [
    "mockup", "wireframe", "prototype", "landing page", "ui design",
    "ux design", "ui/ux", "user interface", "user experience", "layout",
    "color scheme", "typography", "figma", "responsive",
]

[[routing.categories]]
name = "image_generation"
credential = "image_generation_api_key"
stage = "generative"
description = "Image, logo and icon generation"
triggers = [
    "generate an image", "generate image", "create an image", "create image",
    "make an image", "image of", "picture of", "photo of", "draw",
    "illustration", "artwork", "logo", "icon", "wallpaper", "text to image",
    "ai art",
]

[[routing.categories]]
name = "fast"
credential = "fast_api_key"
stage = "quick"
description = "Quick answers for short everyday questions"
triggers = [
    "quick", "brief", "short", "summarize", "tldr", "what is", "what are",
    "who is", "define", "simple answer", "how do i",
]

[[routing.categories]]
name = "coding"
credential = "coding_key"
stage = "general"
description = "Coding and full-stack development"
triggers = [
    "code", "function", "class", "variable", "algorithm", "script", "program",
    "python", "javascript", "typescript", "java", "c++", "rust", "golang",
    "react", "node", "api", "sql", "database", "frontend", "backend",
    "full stack", "fullstack", "implement", "compile", "refactor", "regex",
]

[[routing.categories]]
name = "game_dev"
credential = "game_dev_key"
stage = "general"
description = "Game development and interactive experiences"
triggers = [
    "game", "unity", "unreal", "godot", "sprite", "gameplay", "level design",
    "npc", "shader", "collision", "player movement",
]

[[routing.categories]]
name = "main_brain"
credential = "main_brain_key"
stage = "general"
description = "Advanced reasoning and complex problem solving"
triggers = [
    "analyze", "analyse", "reason", "philosophy", "theory", "research",
    "compare", "contrast", "evaluate", "critique", "in depth", "comprehensive",
    "step by step",
]

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RoutingConfig};

    #[test]
    fn test_template_parses_and_validates() {
        let config: Config = generate_config_template()
            .parse()
            .expect("template should be a valid config");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.credentials.encryption_key_env, "DEVIL_ENCRYPTION_KEY");
    }

    #[test]
    fn test_template_routing_matches_stock_table() {
        let config: Config = generate_config_template().parse().unwrap();
        assert_eq!(config.routing, RoutingConfig::default());
    }

    #[test]
    fn test_cli_parses_credentials_set() {
        let cli = Cli::try_parse_from([
            "devil-router",
            "--config",
            "custom.toml",
            "credentials",
            "set",
            "coding_key",
            "--model",
            "qwen/qwen3-coder",
            "--secret",
            "sk-or-1",
        ])
        .unwrap();
        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Some(Command::Credentials(CredentialsArgs {
                action: CredentialsCommand::Set { name, model, secret },
            })) => {
                assert_eq!(name, "coding_key");
                assert_eq!(model, "qwen/qwen3-coder");
                assert_eq!(secret, "sk-or-1");
            }
            _ => panic!("expected credentials set"),
        }
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["devil-router"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }
}
