//! Error types for grammar loading
//!
//! Every error here is local to one grammar document: the registry logs it
//! and keeps loading the remaining documents.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    /// A placeholder names a key no definition table provides
    #[error("undefined grammar reference '{key}' in pattern '{pattern}'")]
    UndefinedGrammarReference { key: String, pattern: String },

    /// A definition refers back to itself through its placeholders
    #[error("cyclic grammar reference through '{key}'")]
    CyclicReference { key: String },

    /// The expanded pattern is not a valid regular expression
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A definition value has an unsupported shape
    #[error("invalid definition for '{key}': {reason}")]
    InvalidDefinition { key: String, reason: String },

    /// A mandatory section is absent
    #[error("missing grammar section: {0}")]
    MissingSection(&'static str),

    #[error("grammar JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("grammar YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("grammar I/O error: {0}")]
    Io(#[from] std::io::Error),
}
