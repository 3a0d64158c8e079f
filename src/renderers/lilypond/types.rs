//! Type definitions for LilyPond rendering

use serde::{Deserialize, Serialize};

/// Configuration options for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Target LilyPond version (e.g., "2.24.0")
    pub lilypond_version: String,

    /// Spaces per indentation level
    pub indent_width: usize,

    /// Duration of the first note of every grace run
    pub grace_duration: u32,

    /// Whether to emit the `\header` block
    pub emit_header: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            lilypond_version: "2.24.0".to_string(),
            indent_width: 4,
            grace_duration: 32,
            emit_header: true,
        }
    }
}

/// Kinds of bracketed scope the renderer keeps on its context stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Repeat,
    Tuplet(u32),
    Ending,
}

/// Tie continuation across notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieState {
    #[default]
    NotTying,
    /// A tie start was seen; the next note begins the tie
    Armed,
    /// The tie mark goes before the next note
    Active,
}

/// Bar-line variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Single,
    LineEnd,
    PartStart,
    PartEnd,
}

impl BarKind {
    pub fn glyph(self) -> &'static str {
        match self {
            BarKind::Single | BarKind::LineEnd => "|",
            BarKind::PartStart => ".|",
            BarKind::PartEnd => "|.",
        }
    }
}
