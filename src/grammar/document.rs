//! Grammar document model
//!
//! A grammar document is a JSON (or YAML) object describing how source
//! tokens of one notation dialect map to note tokens:
//!
//! - base note-type tables (`note`, `snote`, `gnote`) and any other
//!   object-valued key: canonical pitch name -> source token(s)
//! - `_`: dynamic definitions usable through placeholders; entries named
//!   after a base type are also registered as classifiers
//! - any other key: a compound pattern (or list of patterns); a pattern
//!   without placeholders is a plain literal token
//! - `_modifiers`: patterns wrapping other definitions, with the modifier
//!   set they merge into the produced token
//! - `_docstring`: format metadata and the ordered header rules
//! - `_postprocess`: fallback mapping for tokens nothing else matched
//!
//! Document order is significant and is preserved when reading.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::GrammarError;

/// Base note types, in fallback order
pub const BASE_TYPES: &[&str] = &["note", "snote", "gnote"];

pub const DYNAMIC_SECTION: &str = "_";
pub const DOCSTRING_SECTION: &str = "_docstring";
pub const MODIFIERS_SECTION: &str = "_modifiers";
pub const POSTPROCESS_SECTION: &str = "_postprocess";

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Format metadata from `_docstring`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    #[serde(rename = "FormatName")]
    pub name: String,

    #[serde(rename = "FormatVersion", default)]
    pub version: String,

    #[serde(rename = "FormatExtensions", default)]
    pub extensions: Vec<String>,

    #[serde(rename = "Encoding", default = "default_encoding")]
    pub encoding: String,

    /// Header extraction rules, applied in order
    #[serde(rename = "HeaderInfo", default)]
    pub headers: Vec<HeaderRule>,
}

/// One header extraction rule. A rule without a field only filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderRule {
    pub pattern: String,
    #[serde(default)]
    pub field: Option<String>,
}

/// Canonical name -> source tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    pub entries: Vec<(String, Vec<String>)>,
}

impl LookupTable {
    /// Every source token, in document order
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(_, sources)| sources.iter().map(String::as_str))
    }

    /// Canonical name for a source token
    pub fn canonical(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, sources)| sources.iter().any(|s| s == source))
            .map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifierDef {
    pub name: String,
    pub pattern: String,
    pub applies: Vec<String>,
    pub modify: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawModifier {
    #[serde(rename = "_pattern")]
    pattern: String,
    #[serde(rename = "_applies")]
    applies: Vec<String>,
    #[serde(rename = "_modify", default)]
    modify: Map<String, Value>,
}

/// A grammar document, split into its sections
#[derive(Debug, Clone)]
pub struct GrammarDocument {
    pub info: FormatInfo,
    pub tables: Vec<(String, LookupTable)>,
    pub dynamic: Vec<(String, Vec<String>)>,
    pub definitions: Vec<(String, Vec<String>)>,
    pub modifiers: Vec<ModifierDef>,
    pub postprocess: Vec<(String, Option<String>)>,
}

impl GrammarDocument {
    pub fn from_json(text: &str) -> Result<Self, GrammarError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_yaml(text: &str) -> Result<Self, GrammarError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, GrammarError> {
        let Value::Object(root) = value else {
            return Err(GrammarError::InvalidDefinition {
                key: "<root>".to_string(),
                reason: "grammar document must be an object".to_string(),
            });
        };

        let mut info = None;
        let mut doc = GrammarDocument {
            info: FormatInfo {
                name: String::new(),
                version: String::new(),
                extensions: Vec::new(),
                encoding: default_encoding(),
                headers: Vec::new(),
            },
            tables: Vec::new(),
            dynamic: Vec::new(),
            definitions: Vec::new(),
            modifiers: Vec::new(),
            postprocess: Vec::new(),
        };

        for (key, value) in root {
            match key.as_str() {
                DOCSTRING_SECTION => {
                    info = Some(serde_json::from_value::<FormatInfo>(value)?);
                }
                DYNAMIC_SECTION => {
                    for (k, v) in expect_object(&key, value)? {
                        let patterns = patterns_of(&k, &v)?;
                        doc.dynamic.push((k, patterns));
                    }
                }
                MODIFIERS_SECTION => {
                    for (name, v) in expect_object(&key, value)? {
                        let raw: RawModifier = serde_json::from_value(v)?;
                        doc.modifiers.push(ModifierDef {
                            name,
                            pattern: raw.pattern,
                            applies: raw.applies,
                            modify: raw.modify,
                        });
                    }
                }
                POSTPROCESS_SECTION => {
                    for (token, v) in expect_object(&key, value)? {
                        let target = match v {
                            Value::Null => None,
                            Value::String(s) => Some(s),
                            other => {
                                return Err(GrammarError::InvalidDefinition {
                                    key: token,
                                    reason: format!("fallback must be a type name or null, got {}", other),
                                })
                            }
                        };
                        doc.postprocess.push((token, target));
                    }
                }
                _ => match value {
                    Value::Object(map) => {
                        let table = table_of(&key, map)?;
                        doc.tables.push((key, table));
                    }
                    other => {
                        let patterns = patterns_of(&key, &other)?;
                        doc.definitions.push((key, patterns));
                    }
                },
            }
        }

        doc.info = info.ok_or(GrammarError::MissingSection(DOCSTRING_SECTION))?;
        Ok(doc)
    }

    pub fn table(&self, key: &str) -> Option<&LookupTable> {
        self.tables.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    pub fn dynamic(&self, key: &str) -> Option<&[String]> {
        self.dynamic
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.as_slice())
    }

    pub fn definition(&self, key: &str) -> Option<&[String]> {
        self.definitions
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.as_slice())
    }
}

fn expect_object(key: &str, value: Value) -> Result<Map<String, Value>, GrammarError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GrammarError::InvalidDefinition {
            key: key.to_string(),
            reason: "section must be an object".to_string(),
        }),
    }
}

/// A definition value: one pattern string or a list of them
fn patterns_of(key: &str, value: &Value) -> Result<Vec<String>, GrammarError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| GrammarError::InvalidDefinition {
                        key: key.to_string(),
                        reason: "pattern lists may only contain strings".to_string(),
                    })
            })
            .collect(),
        other => Err(GrammarError::InvalidDefinition {
            key: key.to_string(),
            reason: format!("expected a pattern or list of patterns, got {}", other),
        }),
    }
}

fn table_of(key: &str, map: Map<String, Value>) -> Result<LookupTable, GrammarError> {
    let mut table = LookupTable::default();
    for (name, v) in map {
        let sources = patterns_of(key, &v)?;
        table.entries.push((name, sources));
    }
    Ok(table)
}
