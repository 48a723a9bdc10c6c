//! devil-router - category-aware credential and model routing
//!
//! Classifies chat messages into task categories by keyword, then resolves
//! each category to an encrypted provider credential and the model id stored
//! alongside it, falling back to a default category when needed.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod telemetry;
