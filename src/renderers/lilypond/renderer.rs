//! LilyPond renderer
//!
//! Walks a tune's element sequence and emits LilyPond text. The walk is a
//! state machine over:
//! - a context stack of open bracketed scopes (repeats, endings, tuplets),
//!   closed strictly LIFO
//! - tie continuation (not tying / armed / active)
//! - the previously rendered pitch, for pitch-relative ornaments
//! - the current time signature and any pending measure offset
//!
//! Token types are dispatched through a table built once per process.
//! Unknown types are rendered as comments.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::errors::RenderError;
use super::offset;
use super::ornaments::{self, OrnamentFn, Pitch};
use super::templates::{escape_lilypond_string, render_document, TemplateContext};
use super::types::{BarKind, ContextKind, RenderSettings, TieState};
use crate::models::{NoteToken, Tune, TuneElement};
use crate::parse::postprocess::time_of;

#[derive(Clone, Copy)]
enum Handler {
    Note,
    Rest,
    Time,
    Clef,
    Ignore,
    Bar(BarKind),
    RepeatStart,
    RepeatEnd,
    EndingStart,
    EndingEnd,
    Tie,
    TieStart,
    TieEnd,
    Ornament(OrnamentFn),
}

static DISPATCH: Lazy<HashMap<&'static str, Handler>> = Lazy::new(|| {
    HashMap::from([
        ("note", Handler::Note),
        ("rest", Handler::Rest),
        ("time_notation", Handler::Time),
        ("clef", Handler::Clef),
        ("key_signature", Handler::Ignore),
        ("dot", Handler::Ignore),
        ("tuplet_start", Handler::Ignore),
        ("tuplet_end", Handler::Ignore),
        ("bar", Handler::Bar(BarKind::Single)),
        ("line_end", Handler::Bar(BarKind::LineEnd)),
        ("part_start", Handler::Bar(BarKind::PartStart)),
        ("part_end", Handler::Bar(BarKind::PartEnd)),
        ("repeat_start", Handler::RepeatStart),
        ("repeat_end", Handler::RepeatEnd),
        ("ending_start", Handler::EndingStart),
        ("ending_end", Handler::EndingEnd),
        ("tie", Handler::Tie),
        ("tie_start", Handler::TieStart),
        ("tie_end", Handler::TieEnd),
        ("grace", Handler::Ornament(ornaments::grace)),
        ("strike", Handler::Ornament(ornaments::strike)),
        ("double", Handler::Ornament(ornaments::double)),
        ("gracestrike", Handler::Ornament(ornaments::gracestrike)),
        ("grip", Handler::Ornament(ornaments::grip)),
        ("taorluath", Handler::Ornament(ornaments::taorluath)),
        ("birl", Handler::Ornament(ornaments::birl)),
        ("throw", Handler::Ornament(ornaments::throw)),
        ("cadence", Handler::Ornament(ornaments::cadence)),
        ("crunluath", Handler::Ornament(ornaments::crunluath)),
        ("rodin", Handler::Ornament(ornaments::rodin)),
    ])
});

/// Token types the renderer has a handler for
pub fn known_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = DISPATCH.keys().copied().collect();
    types.sort_unstable();
    types
}

/// An open bracketed scope and the text that closes it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Context {
    kind: ContextKind,
    closing: String,
    indents: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderState {
    indent: usize,
    contexts: Vec<Context>,
    tie: TieState,
    prev_pitch: Option<Pitch>,
    time: (u32, u32),
    pending_offset: Option<String>,
}

impl RenderState {
    fn new(time: (u32, u32)) -> Self {
        Self {
            indent: 0,
            contexts: Vec::new(),
            tie: TieState::NotTying,
            prev_pitch: None,
            time,
            pending_offset: None,
        }
    }
}

/// Stateful LilyPond renderer. State is reset on every `from_tune` call;
/// use one instance per concurrent render.
#[derive(Debug, Clone)]
pub struct LilyPondRenderer {
    settings: RenderSettings,
    state: RenderState,
}

impl Default for LilyPondRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl LilyPondRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            state: RenderState::new((4, 4)),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Current indentation depth
    pub fn depth(&self) -> usize {
        self.state.indent
    }

    /// Number of scopes still open
    pub fn open_contexts(&self) -> usize {
        self.state.contexts.len()
    }

    /// Render a complete LilyPond document
    pub fn from_tune(&mut self, tune: &Tune) -> Result<String, RenderError> {
        let music = self.render_music(tune)?;
        let context = TemplateContext::from_tune(&self.settings, tune, music);
        render_document(&context)
    }

    /// Render only the music body
    pub fn render_music(&mut self, tune: &Tune) -> Result<String, RenderError> {
        self.state = RenderState::new(tune.time);
        self.state.pending_offset = offset::pending_offset(tune.time, &tune.notes)?;

        let mut pieces = Vec::with_capacity(tune.notes.len());
        for (i, element) in tune.notes.iter().enumerate() {
            let following = &tune.notes[i + 1..];
            let piece = match element {
                TuneElement::Note(token) => self.render_token(token, following)?,
                TuneElement::Inline(header) => format!(
                    "<>_\\markup {{ \"{}\" }}",
                    escape_lilypond_string(&header.value)
                ),
                TuneElement::Unparsed(raw) => comment(raw),
            };
            if !piece.is_empty() {
                pieces.push(piece);
            }
        }

        while let Some(context) = self.state.contexts.last().cloned() {
            log::warn!("{:?} still open at end of tune, closing", context.kind);
            pieces.push(self.close(context.kind));
        }

        Ok(pieces.join(" "))
    }

    fn render_token(
        &mut self,
        token: &NoteToken,
        following: &[TuneElement],
    ) -> Result<String, RenderError> {
        let Some(handler) = DISPATCH.get(token.note_type.as_str()).copied() else {
            let err = RenderError::UnrecognizedToken {
                note_type: token.note_type.clone(),
            };
            log::warn!("{}, rendering as comment", err);
            return Ok(comment(&token.to_string()));
        };

        let text = match handler {
            Handler::Note => self.note(token, following)?,
            Handler::Rest => {
                let length = length_of(token)?;
                self.take_offset(format!("r{}{}", length, dots(token.dot_count())))
            }
            Handler::Time => self.time(token, following)?,
            Handler::Clef => self.structural("\\clef treble"),
            Handler::Ignore => String::new(),
            Handler::Bar(kind) => self.bar(kind, following)?,
            Handler::RepeatStart => {
                self.state.pending_offset = offset::pending_offset(self.state.time, following)?;
                self.open(ContextKind::Repeat, "\\repeat volta 2 {", "}\n", true)
            }
            Handler::RepeatEnd => self.close(ContextKind::Repeat),
            Handler::EndingStart => {
                let mut text = String::new();
                if self.top_is(ContextKind::Ending) {
                    text.push_str(&self.close(ContextKind::Ending));
                }
                let number = token.arg(0).unwrap_or("1");
                text.push_str(&self.open(
                    ContextKind::Ending,
                    &format!(
                        "\\set Score.repeatCommands = #'((volta \"{}\"))",
                        escape_lilypond_string(number)
                    ),
                    "\\set Score.repeatCommands = #'((volta #f))",
                    true,
                ));
                text
            }
            Handler::EndingEnd => self.close(ContextKind::Ending),
            Handler::Tie => "~".to_string(),
            Handler::TieStart => {
                self.state.tie = TieState::Armed;
                String::new()
            }
            Handler::TieEnd => {
                self.state.tie = TieState::NotTying;
                String::new()
            }
            Handler::Ornament(build) => {
                let run = build(token, self.state.prev_pitch)?;
                self.take_offset(ornaments::build_embellishment(&run, self.settings.grace_duration))
            }
        };
        Ok(text)
    }

    fn note(&mut self, token: &NoteToken, following: &[TuneElement]) -> Result<String, RenderError> {
        let name = token
            .kwarg("note")
            .or_else(|| token.arg(0))
            .ok_or_else(|| RenderError::invalid_note(token, "missing pitch"))?;
        let pitch = Pitch::parse(name)
            .ok_or_else(|| RenderError::invalid_note(token, format!("unknown pitch {:?}", name)))?;
        let length = length_of(token)?;

        let mut text = String::new();
        let tuplet = tuplet_of(token);
        if let Some((id, arity)) = tuplet {
            if !self.top_is(ContextKind::Tuplet(id)) {
                if let Some(open) = self.open_tuplet() {
                    text.push_str(&self.close(open));
                    text.push(' ');
                }
                text.push_str(&self.open(
                    ContextKind::Tuplet(id),
                    &format!("\\tuplet {}/{} {{", arity, tuplet_span(arity)),
                    "}",
                    false,
                ));
                text.push(' ');
            }
        }

        if self.state.tie == TieState::Active {
            text.push_str("~ ");
            self.state.tie = TieState::NotTying;
        } else if self.state.tie == TieState::Armed {
            self.state.tie = TieState::Active;
        }

        text.push_str(pitch.lilypond());
        text.push_str(&length.to_string());
        text.push_str(&dots(token.dot_count()));
        self.state.prev_pitch = Some(pitch);

        if let Some((id, _)) = tuplet {
            let next_id = following
                .iter()
                .filter_map(TuneElement::as_note)
                .find(|t| t.is_note())
                .and_then(tuplet_of)
                .map(|(next, _)| next);
            if next_id != Some(id) {
                text.push(' ');
                text.push_str(&self.close(ContextKind::Tuplet(id)));
            }
        }

        Ok(self.take_offset(text))
    }

    fn time(&mut self, token: &NoteToken, following: &[TuneElement]) -> Result<String, RenderError> {
        match time_of(token) {
            Some((numerator, denominator)) => {
                self.state.time = (numerator, denominator);
                self.state.pending_offset = offset::pending_offset(self.state.time, following)?;
                Ok(self.structural(&format!("\\time {}/{}", numerator, denominator)))
            }
            None => {
                log::warn!("Time signature without numerator/denominator: {}", token);
                Ok(String::new())
            }
        }
    }

    fn bar(&mut self, kind: BarKind, following: &[TuneElement]) -> Result<String, RenderError> {
        let mut text = self.structural(&format!("\\bar \"{}\"", kind.glyph()));
        match kind {
            BarKind::LineEnd => text.push_str(&self.structural("\\break")),
            BarKind::PartStart => {
                self.state.pending_offset = offset::pending_offset(self.state.time, following)?;
            }
            BarKind::Single | BarKind::PartEnd => {}
        }
        Ok(text)
    }

    /// Prefix the pending measure offset, if any, to the first musical output
    fn take_offset(&mut self, text: String) -> String {
        match self.state.pending_offset.take() {
            Some(offset) => format!("{} {}", self.structural(&offset), text),
            None => text,
        }
    }

    fn structural(&self, text: &str) -> String {
        format!(
            "\n{}{}",
            " ".repeat(self.state.indent * self.settings.indent_width),
            text
        )
    }

    fn top_is(&self, kind: ContextKind) -> bool {
        self.state.contexts.last().map(|c| c.kind) == Some(kind)
    }

    fn open_tuplet(&self) -> Option<ContextKind> {
        match self.state.contexts.last().map(|c| c.kind) {
            Some(kind @ ContextKind::Tuplet(_)) => Some(kind),
            _ => None,
        }
    }

    fn open(&mut self, kind: ContextKind, opening: &str, closing: &str, indents: bool) -> String {
        let text = if indents {
            self.structural(opening)
        } else {
            opening.to_string()
        };
        self.state.contexts.push(Context {
            kind,
            closing: closing.to_string(),
            indents,
        });
        if indents {
            self.state.indent += 1;
        }
        text
    }

    /// Close the top scope if it is of `kind`; otherwise do nothing
    fn close(&mut self, kind: ContextKind) -> String {
        if !self.top_is(kind) {
            log::debug!(
                "Ignoring close of {:?}; top of stack is {:?}",
                kind,
                self.state.contexts.last().map(|c| c.kind)
            );
            return String::new();
        }
        let Some(context) = self.state.contexts.pop() else {
            return String::new();
        };
        if context.indents {
            self.state.indent = self.state.indent.saturating_sub(1);
            self.structural(&context.closing)
        } else {
            context.closing
        }
    }
}

fn comment(text: &str) -> String {
    format!("%{{ {} %}}", text.replace("%}", "% }"))
}

fn dots(count: u32) -> String {
    ".".repeat(count as usize)
}

fn length_of(token: &NoteToken) -> Result<u32, RenderError> {
    let raw = token
        .kwarg("length")
        .or_else(|| token.arg(1))
        .ok_or_else(|| RenderError::invalid_note(token, "missing length"))?;
    raw.parse::<u32>()
        .ok()
        .filter(|l| l.is_power_of_two())
        .ok_or_else(|| RenderError::invalid_note(token, format!("invalid length {:?}", raw)))
}

fn tuplet_of(token: &NoteToken) -> Option<(u32, u32)> {
    let id = token.modifier("tuplet")?.as_u64()? as u32;
    let arity = token
        .modifier("tuplet_arity")
        .and_then(|a| a.as_u64())
        .unwrap_or(3) as u32;
    Some((id, arity))
}

/// Notes a tuplet of `arity` takes the time of
fn tuplet_span(arity: u32) -> u32 {
    if arity == 2 {
        return 3;
    }
    let mut span = 1;
    while span * 2 < arity {
        span *= 2;
    }
    span
}
