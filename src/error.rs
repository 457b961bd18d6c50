//! Error types with fix suggestions
//!
//! Unresolvable identifiers are not errors: the token is left verbatim.
//! Everything here is either a resolver failure (isolated per token by the
//! context) or a problem at the edges (config, JSON, splice patterns).

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Resolution errors (REPLACE-010 to REPLACE-011)
    // ─────────────────────────────────────────────────────────────

    #[error("REPLACE-010: Placeholder '{identifier}' failed on token '%{token}%': {reason}")]
    Resolve {
        identifier: String,
        token: String,
        reason: String,
    },

    #[error("REPLACE-011: Invalid splice pattern: {0}")]
    Pattern(#[from] regex::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration errors (REPLACE-020 to REPLACE-021)
    // ─────────────────────────────────────────────────────────────

    #[error("REPLACE-020: Config parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("REPLACE-021: Invalid value '{value}' for {key}")]
    InvalidEnv { key: String, value: String },

    // ─────────────────────────────────────────────────────────────
    // Component model errors (REPLACE-030)
    // ─────────────────────────────────────────────────────────────

    #[error("REPLACE-030: Component JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReplaceError {
    pub(crate) fn resolve(identifier: &str, token: &str, reason: impl ToString) -> Self {
        ReplaceError::Resolve {
            identifier: identifier.to_string(),
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FixSuggestion for ReplaceError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ReplaceError::Io(_) => Some("Check file path and permissions"),
            ReplaceError::Resolve { .. } => {
                Some("Check the placeholder arguments after '_' match what the resolver expects")
            }
            ReplaceError::Pattern(_) => Some("Use non-empty literal substrings as splice keys"),
            ReplaceError::Config(_) => {
                Some("Expected keys: ttl_ticks, tick_millis, sweep_after (all integers)")
            }
            ReplaceError::InvalidEnv { .. } => Some("Use a non-negative integer"),
            ReplaceError::Json(_) => {
                Some("Use chat-component JSON: {\"text\": \"...\", \"extra\": [...]}")
            }
        }
    }
}
