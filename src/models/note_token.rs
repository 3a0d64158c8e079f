//! Structured note tokens
//!
//! A `NoteToken` is one classified musical event: its type tag, the
//! arguments captured from the source token and any modifiers merged in by
//! modifier classifiers or by post-processing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Argument and modifier values are plain JSON values, as in the grammar document
pub type Value = serde_json::Value;

/// One classified event in a tune
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NoteToken {
    /// Type tag (e.g. "note", "double", "repeat_start")
    pub note_type: String,

    /// Captured arguments in source order
    pub ordered_arguments: Vec<Value>,

    /// Captured arguments keyed by capture-group name
    pub keyword_arguments: BTreeMap<String, Value>,

    /// Capture-group name -> index into `ordered_arguments`
    pub argument_indices: BTreeMap<String, usize>,

    /// Attribute flags such as `dot`, `half`, `thumb`
    pub modifiers: BTreeMap<String, Value>,
}

impl NoteToken {
    /// Create a token with no arguments or modifiers
    pub fn new<S: Into<String>>(note_type: S) -> Self {
        Self {
            note_type: note_type.into(),
            ..Default::default()
        }
    }

    /// Create a token from `(name, value)` argument pairs, kept in the given order
    pub fn with_args<S: Into<String>>(note_type: S, args: &[(&str, &str)]) -> Self {
        let mut token = Self::new(note_type);
        for (name, value) in args {
            token.push_argument(name, Value::String(value.to_string()));
        }
        token
    }

    /// Append a named argument
    pub fn push_argument(&mut self, name: &str, value: Value) {
        self.argument_indices
            .insert(name.to_string(), self.ordered_arguments.len());
        self.ordered_arguments.push(value.clone());
        self.keyword_arguments.insert(name.to_string(), value);
    }

    /// Set a named argument, replacing it only when `force` is set
    pub fn set_arg(&mut self, name: &str, value: Value, force: bool) {
        if !force && self.keyword_arguments.contains_key(name) {
            return;
        }
        match self.argument_indices.get(name) {
            Some(&i) => {
                self.ordered_arguments[i] = value.clone();
                self.keyword_arguments.insert(name.to_string(), value);
            }
            None => self.push_argument(name, value),
        }
    }

    /// Positional argument as a string, if present
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.ordered_arguments.get(index).and_then(Value::as_str)
    }

    /// Named argument as a string, if present
    pub fn kwarg(&self, name: &str) -> Option<&str> {
        self.keyword_arguments.get(name).and_then(Value::as_str)
    }

    /// All positional arguments that are strings
    pub fn string_args(&self) -> Vec<&str> {
        self.ordered_arguments
            .iter()
            .filter_map(Value::as_str)
            .collect()
    }

    pub fn add_modifiers(&mut self, modifiers: &BTreeMap<String, Value>) {
        for (k, v) in modifiers {
            self.modifiers.insert(k.clone(), v.clone());
        }
    }

    pub fn modifier(&self, name: &str) -> Option<&Value> {
        self.modifiers.get(name)
    }

    /// True when the modifier is present and not `false`/`null`
    pub fn has_flag(&self, name: &str) -> bool {
        match self.modifiers.get(name) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }

    /// Number of augmentation dots folded into this token
    pub fn dot_count(&self) -> u32 {
        self.modifiers
            .get("dot")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(0)
    }

    /// Add `count` dots to the `dot` modifier
    pub fn add_dots(&mut self, count: u32) {
        let total = self.dot_count() + count;
        self.modifiers.insert("dot".to_string(), Value::from(total));
    }

    pub fn is_note(&self) -> bool {
        self.note_type == "note"
    }
}

impl std::fmt::Display for NoteToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args = self.string_args().join(", ");
        write!(f, "{}({})", self.note_type, args)?;
        if !self.modifiers.is_empty() {
            let mods = self
                .modifiers
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " {{{}}}", mods)?;
        }
        Ok(())
    }
}
