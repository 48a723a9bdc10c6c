//! Immutable category table built from configuration
//!
//! Triggers are lower-cased once here so classification only lower-cases
//! the message. Rules are kept sorted by stage; the sort is stable, so
//! declaration order survives within a stage.

use super::Stage;
use crate::config::RoutingConfig;
use crate::error::AppResult;

/// One category with its credential name and lower-cased triggers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    credential: String,
    stage: Stage,
    description: String,
    triggers: Vec<String>,
}

impl CategoryRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the credential record this category resolves to
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// First listed trigger contained in `lowered`, if any
    pub(crate) fn first_match(&self, lowered: &str) -> Option<&str> {
        self.triggers
            .iter()
            .find(|trigger| lowered.contains(trigger.as_str()))
            .map(String::as_str)
    }
}

/// Validated, read-only routing table shared across requests
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rules: Vec<CategoryRule>,
    default_index: usize,
    fast_index: Option<usize>,
    short_message_chars: usize,
    quick_message_chars: usize,
}

impl RoutingTable {
    /// Build a table from routing configuration
    ///
    /// # Errors
    /// Returns `AppError::Config` when the configuration does not validate.
    pub fn from_config(config: &RoutingConfig) -> AppResult<Self> {
        config.validate()?;

        let mut rules: Vec<CategoryRule> = config
            .categories
            .iter()
            .map(|category| CategoryRule {
                name: category.name.clone(),
                credential: category.credential.trim().to_string(),
                stage: category.stage,
                description: category.description.clone(),
                triggers: category
                    .triggers
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .collect(),
            })
            .collect();
        rules.sort_by_key(|rule| rule.stage);

        // validate() guarantees both names are present
        let default_index = rules
            .iter()
            .position(|rule| rule.name == config.default_category)
            .ok_or_else(|| {
                crate::error::AppError::Config(format!(
                    "default category '{}' missing from table",
                    config.default_category
                ))
            })?;
        let fast_index = config
            .fast_category
            .as_ref()
            .and_then(|fast| rules.iter().position(|rule| &rule.name == fast));

        tracing::debug!(
            categories = rules.len(),
            default_category = %config.default_category,
            fast_category = ?config.fast_category,
            "Routing table built"
        );

        Ok(Self {
            rules,
            default_index,
            fast_index,
            short_message_chars: config.short_message_chars,
            quick_message_chars: config.quick_message_chars,
        })
    }

    /// All rules in scan order
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn get(&self, category: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.name == category)
    }

    pub fn default_rule(&self) -> &CategoryRule {
        &self.rules[self.default_index]
    }

    pub fn fast_rule(&self) -> Option<&CategoryRule> {
        self.fast_index.map(|index| &self.rules[index])
    }

    pub fn short_message_chars(&self) -> usize {
        self.short_message_chars
    }

    pub fn quick_message_chars(&self) -> usize {
        self.quick_message_chars
    }

    /// Rules of one stage, in declaration order
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().filter(move |rule| rule.stage == stage)
    }
}
