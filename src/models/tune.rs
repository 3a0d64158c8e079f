//! Parsed tune representation
//!
//! Header fields plus the ordered element sequence produced by the parser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::note_token::{NoteToken, Value};

/// A header field extracted by the preprocessor
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HeaderField {
    pub field: String,
    pub value: String,
}

impl HeaderField {
    pub fn new<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One element of the tune's musical sequence
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TuneElement {
    /// A classified note token
    Note(NoteToken),
    /// A header field occurring after its first occurrence (rendered as an annotation)
    Inline(HeaderField),
    /// A source token no classifier or fallback recognized
    Unparsed(String),
}

impl TuneElement {
    pub fn as_note(&self) -> Option<&NoteToken> {
        match self {
            TuneElement::Note(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_note_mut(&mut self) -> Option<&mut NoteToken> {
        match self {
            TuneElement::Note(token) => Some(token),
            _ => None,
        }
    }

    /// The note type, if this element is a note token
    pub fn note_type(&self) -> Option<&str> {
        self.as_note().map(|t| t.note_type.as_str())
    }
}

impl From<NoteToken> for TuneElement {
    fn from(token: NoteToken) -> Self {
        TuneElement::Note(token)
    }
}

/// Scalar header fields the tune stores directly
pub const SCALAR_FIELDS: &[&str] = &["title", "composer", "tunetype", "footer", "tempo"];

/// A fully parsed document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tune {
    pub title: String,
    pub composer: String,
    pub tune_type: String,
    pub footer: String,
    pub tempo: u32,
    pub time: (u32, u32),

    /// Musical sequence in source order
    pub notes: Vec<TuneElement>,

    /// Header fields with no scalar slot
    pub misc: BTreeMap<String, Value>,

    /// Fields already populated from a header
    #[serde(skip)]
    pub(crate) populated: Vec<String>,
}

impl Default for Tune {
    fn default() -> Self {
        Self {
            title: String::new(),
            composer: String::new(),
            tune_type: String::new(),
            footer: String::new(),
            tempo: 0,
            time: (4, 4),
            notes: Vec::new(),
            misc: BTreeMap::new(),
            populated: Vec::new(),
        }
    }
}

impl Tune {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a header field has already been stored
    pub fn is_populated(&self, field: &str) -> bool {
        self.populated.iter().any(|f| f == field)
    }

    /// Store a header field if it is the first occurrence of that field.
    ///
    /// Returns false when the field was already populated; the caller then
    /// forwards the header as an inline element. A tempo that is not an
    /// integer is dropped (and counts as consumed).
    pub fn set_header(&mut self, header: &HeaderField) -> bool {
        if self.is_populated(&header.field) {
            return false;
        }
        let value = header.value.trim().to_string();
        match header.field.as_str() {
            "title" => self.title = value,
            "composer" => self.composer = value,
            "tunetype" | "tune_type" => self.tune_type = value,
            "footer" => self.footer = value,
            "tempo" => match value.parse::<u32>() {
                Ok(tempo) => self.tempo = tempo,
                Err(_) => {
                    log::warn!("Malformed tempo header {:?}, ignoring", value);
                    return true;
                }
            },
            other => {
                self.misc.insert(other.to_string(), Value::String(value));
            }
        }
        self.populated.push(header.field.clone());
        true
    }

    /// Iterate over the note tokens, skipping inline and unparsed elements
    pub fn note_tokens(&self) -> impl Iterator<Item = &NoteToken> {
        self.notes.iter().filter_map(TuneElement::as_note)
    }

    /// Unparsed source tokens, for inspection
    pub fn unparsed(&self) -> Vec<&str> {
        self.notes
            .iter()
            .filter_map(|e| match e {
                TuneElement::Unparsed(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Display for Tune {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) by {} [{}/{}, tempo {}], {} elements",
            self.title,
            self.tune_type,
            self.composer,
            self.time.0,
            self.time.1,
            self.tempo,
            self.notes.len()
        )
    }
}
