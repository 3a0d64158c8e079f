//! Parse-and-render pipeline
//!
//! The one entry point the outer layers need: a complete source buffer in,
//! a complete LilyPond document (or a descriptive error) out.

use thiserror::Error;

use crate::grammar::{GrammarError, GrammarRegistry};
use crate::parse::TuneParser;
use crate::renderers::{render_tune, RenderError, RenderSettings};

#[derive(Debug, Error)]
pub enum TransposeError {
    /// No loaded grammar has this name or file extension
    #[error("unknown source format '{0}'")]
    UnknownFormat(String),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Parse `source` with the grammar named `format` (a format name or a file
/// extension) and render it to LilyPond.
pub fn transpose(
    registry: &GrammarRegistry,
    format: &str,
    source: &str,
    settings: &RenderSettings,
) -> Result<String, TransposeError> {
    let grammar = registry
        .by_name(format)
        .or_else(|| registry.by_extension(format))
        .ok_or_else(|| TransposeError::UnknownFormat(format.to_string()))?;

    let tune = TuneParser::new(grammar).parse(source);
    Ok(render_tune(&tune, settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format() {
        let registry = GrammarRegistry::new();
        let err = transpose(&registry, "abc", "", &RenderSettings::default()).unwrap_err();
        assert!(matches!(err, TransposeError::UnknownFormat(name) if name == "abc"));
    }

    #[test]
    fn test_lookup_by_extension() {
        let registry = GrammarRegistry::builtin().unwrap();
        let out = transpose(&registry, "bww", "& LA_4", &RenderSettings::default()).unwrap();
        assert!(out.contains("\\clef treble"));
        assert!(out.contains("a'4"));
    }
}
