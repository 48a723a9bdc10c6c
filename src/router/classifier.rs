//! Keyword-based category classification
//!
//! Pure CPU logic with no I/O: safe to share across any number of
//! concurrent requests.
//!
//! Scan order is fixed by [`Stage`]:
//! 1. urgent, structured, layout, generative categories (first trigger hit wins)
//! 2. length-gated fast path
//! 3. general categories in declaration order
//! 4. the default category
//!
//! Matching is case-insensitive substring containment, so `"game"` also
//! matches inside `"endgame"`.

use super::table::{CategoryRule, RoutingTable};
use super::Stage;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stages scanned before the fast path
const PRE_FAST_STAGES: [Stage; 4] = [
    Stage::Urgent,
    Stage::Structured,
    Stage::Layout,
    Stage::Generative,
];

/// What made the classifier pick a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "trigger", rename_all = "snake_case")]
pub enum MatchBasis<'a> {
    /// A category trigger was found in the message
    Trigger(&'a str),
    /// Message was below the short-message threshold
    ShortMessage,
    /// Message was below the quick threshold and contained a fast trigger
    QuickMessage(&'a str),
    /// Nothing matched
    Default,
}

impl fmt::Display for MatchBasis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger(trigger) => write!(f, "trigger \"{}\"", trigger),
            Self::ShortMessage => write!(f, "short message"),
            Self::QuickMessage(trigger) => write!(f, "quick request \"{}\"", trigger),
            Self::Default => write!(f, "no trigger matched"),
        }
    }
}

/// Result of classifying one message
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub rule: &'a CategoryRule,
    pub basis: MatchBasis<'a>,
}

impl<'a> Classification<'a> {
    pub fn category(&self) -> &'a str {
        self.rule.name()
    }
}

/// Maps free text to exactly one category of the routing table
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    table: Arc<RoutingTable>,
}

impl CategoryClassifier {
    pub fn new(table: Arc<RoutingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Classify a message
    ///
    /// Total: every input, including the empty string, yields a category.
    pub fn classify(&self, message: &str) -> Classification<'_> {
        let lowered = message.to_lowercase();

        for stage in PRE_FAST_STAGES {
            if let Some(hit) = self.scan(stage, &lowered) {
                return hit;
            }
        }

        if let Some(fast) = self.table.fast_rule() {
            // Character count, not bytes, so multi-byte text is not penalized
            let length = message.chars().count();
            if length < self.table.short_message_chars() {
                return Classification {
                    rule: fast,
                    basis: MatchBasis::ShortMessage,
                };
            }
            if length < self.table.quick_message_chars() {
                if let Some(trigger) = fast.first_match(&lowered) {
                    return Classification {
                        rule: fast,
                        basis: MatchBasis::QuickMessage(trigger),
                    };
                }
            }
        }

        if let Some(hit) = self.scan(Stage::General, &lowered) {
            return hit;
        }

        Classification {
            rule: self.table.default_rule(),
            basis: MatchBasis::Default,
        }
    }

    fn scan<'a>(&'a self, stage: Stage, lowered: &str) -> Option<Classification<'a>> {
        self.table.stage(stage).find_map(|rule| {
            rule.first_match(lowered).map(|trigger| Classification {
                rule,
                basis: MatchBasis::Trigger(trigger),
            })
        })
    }
}
