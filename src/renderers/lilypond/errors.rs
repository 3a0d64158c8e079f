//! Error types for LilyPond rendering
//!
//! Any of these aborts the render call it came from; no partial document
//! is returned.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{NoteToken, Value};

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// An ornament got a pitch or modifier combination it has no table entry for
    #[error("cannot render ornament '{ornament}' {arguments:?} {modifiers:?}: {reason}")]
    Ornament {
        ornament: String,
        arguments: Vec<String>,
        modifiers: BTreeMap<String, Value>,
        reason: String,
    },

    /// A note or rest is missing its pitch or duration
    #[error("cannot render '{note_type}' {arguments:?}: {reason}")]
    InvalidNote {
        note_type: String,
        arguments: Vec<String>,
        reason: String,
    },

    /// No handler is registered for the token type
    #[error("unrecognized token type '{note_type}'")]
    UnrecognizedToken { note_type: String },

    #[error("template rendering failed: {0}")]
    Template(String),
}

impl RenderError {
    pub fn ornament<S: Into<String>>(token: &NoteToken, reason: S) -> Self {
        RenderError::Ornament {
            ornament: token.note_type.clone(),
            arguments: token.string_args().into_iter().map(str::to_string).collect(),
            modifiers: token.modifiers.clone(),
            reason: reason.into(),
        }
    }

    pub fn invalid_note<S: Into<String>>(token: &NoteToken, reason: S) -> Self {
        RenderError::InvalidNote {
            note_type: token.note_type.clone(),
            arguments: token.string_args().into_iter().map(str::to_string).collect(),
            reason: reason.into(),
        }
    }
}
