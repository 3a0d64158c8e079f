//! Post-processing of the classified token stream
//!
//! Folds auxiliary tokens into their neighbours:
//! - time-signature aliases become `time_notation` tokens
//! - dot markers add to the preceding note's `dot` modifier
//! - tuplet brackets tag the enclosed notes and are removed

use serde_json::json;

use crate::models::{NoteToken, TuneElement};

/// Alias token -> (numerator, denominator)
const TIME_ALIASES: &[(&str, (&str, &str))] =
    &[("common_time", ("4", "4")), ("cut_time", ("2", "2"))];

const DEFAULT_TUPLET_ARITY: u32 = 3;

pub fn postprocess(elements: Vec<TuneElement>) -> Vec<TuneElement> {
    let elements = canonicalize_time(elements);
    let elements = fold_dots(elements);
    bracket_tuplets(elements)
}

pub fn canonicalize_time(elements: Vec<TuneElement>) -> Vec<TuneElement> {
    elements
        .into_iter()
        .map(|element| {
            let alias = element
                .note_type()
                .and_then(|t| TIME_ALIASES.iter().find(|(name, _)| *name == t));
            match alias {
                Some((_, (numerator, denominator))) => TuneElement::Note(NoteToken::with_args(
                    "time_notation",
                    &[("numerator", *numerator), ("denominator", *denominator)],
                )),
                None => element,
            }
        })
        .collect()
}

/// Dots a dot token contributes: one per apostrophe
fn dots_in(token: &NoteToken) -> u32 {
    token
        .kwarg("dots")
        .map(|d| d.chars().filter(|&c| c == '\'').count() as u32)
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

pub fn fold_dots(elements: Vec<TuneElement>) -> Vec<TuneElement> {
    let mut out: Vec<TuneElement> = Vec::with_capacity(elements.len());

    for element in elements {
        let dots = element
            .as_note()
            .filter(|t| t.note_type == "dot")
            .map(dots_in);
        let Some(dots) = dots else {
            out.push(element);
            continue;
        };

        let target = out
            .iter_mut()
            .rev()
            .filter_map(TuneElement::as_note_mut)
            .find(|t| t.is_note());
        match target {
            Some(note) => note.add_dots(dots),
            None => log::warn!("Dot marker with no preceding note, dropping"),
        }
    }

    out
}

pub fn bracket_tuplets(elements: Vec<TuneElement>) -> Vec<TuneElement> {
    let mut out = Vec::with_capacity(elements.len());
    let mut open: Option<(u32, u32)> = None;
    let mut next_id = 0;

    for mut element in elements {
        match element.note_type() {
            Some("tuplet_start") => {
                let arity = element
                    .as_note()
                    .and_then(|t| t.kwarg("arity"))
                    .and_then(|a| a.parse().ok())
                    .unwrap_or(DEFAULT_TUPLET_ARITY);
                if let Some((id, _)) = open {
                    log::warn!("Tuplet {} still open at a new tuplet start, closing it", id);
                }
                next_id += 1;
                open = Some((next_id, arity));
                continue;
            }
            Some("tuplet_end") => {
                if open.take().is_none() {
                    log::warn!("Tuplet end with no open tuplet, dropping");
                }
                continue;
            }
            _ => {}
        }

        if let (Some((id, arity)), Some(note)) = (open, element.as_note_mut()) {
            if note.is_note() {
                note.modifiers.insert("tuplet".to_string(), json!(id));
                note.modifiers.insert("tuplet_arity".to_string(), json!(arity));
            }
        }
        out.push(element);
    }

    out
}

/// The first time signature in the stream, if any
pub fn first_time_signature(elements: &[TuneElement]) -> Option<(u32, u32)> {
    elements
        .iter()
        .filter_map(TuneElement::as_note)
        .find(|t| t.note_type == "time_notation")
        .and_then(time_of)
}

pub fn time_of(token: &NoteToken) -> Option<(u32, u32)> {
    let numerator = token.kwarg("numerator")?.parse().ok()?;
    let denominator = token.kwarg("denominator")?.parse().ok()?;
    Some((numerator, denominator))
}
