//! LilyPond document template
//!
//! The rendered music body is wrapped in a Mustache template carrying the
//! tune's header fields. Every value is escaped for LilyPond before it is
//! placed in the context; the template uses unescaped (`{{{ }}}`) tags.

use serde::Serialize;

use super::errors::RenderError;
use super::types::RenderSettings;
use crate::models::Tune;

const BAGPIPE_TEMPLATE: &str = include_str!("templates/bagpipe.ly.mustache");

/// Context data for template rendering
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub version: String,
    pub emit_header: bool,
    pub title: String,
    pub composer: String,
    pub tune_type: String,
    pub footer: String,
    pub has_tempo: bool,
    pub tempo: String,
    /// Rendered music body
    pub music: String,
}

impl TemplateContext {
    pub fn new(version: String, music: String) -> Self {
        Self {
            version,
            emit_header: false,
            title: String::new(),
            composer: String::new(),
            tune_type: String::new(),
            footer: String::new(),
            has_tempo: false,
            tempo: String::new(),
            music,
        }
    }

    /// Context for a tune's header fields and its rendered body
    pub fn from_tune(settings: &RenderSettings, tune: &Tune, music: String) -> Self {
        let mut context = Self::new(settings.lilypond_version.clone(), music);
        context.emit_header = settings.emit_header;
        context.title = escape_lilypond_string(&tune.title);
        context.composer = escape_lilypond_string(&tune.composer);
        context.tune_type = escape_lilypond_string(&tune.tune_type);
        context.footer = escape_lilypond_string(&tune.footer);
        if tune.tempo > 0 {
            context.has_tempo = true;
            context.tempo = tune.tempo.to_string();
        }
        context
    }
}

pub fn render_document(context: &TemplateContext) -> Result<String, RenderError> {
    let template = mustache::compile_str(BAGPIPE_TEMPLATE)
        .map_err(|e| RenderError::Template(e.to_string()))?;
    template
        .render_to_string(context)
        .map_err(|e| RenderError::Template(e.to_string()))
}

/// Escape special characters for LilyPond strings
pub fn escape_lilypond_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
