//! Token classification
//!
//! Splits residual text on whitespace and classifies each token against a
//! compiled grammar: exact literals first, then the ordered classifiers,
//! then the postprocess fallback table.

use crate::grammar::CompiledGrammar;
use crate::models::{NoteToken, TuneElement};

/// Result of classifying one source token
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Token(NoteToken),
    /// Explicitly ignored by the fallback table
    Ignored,
    /// Nothing recognized the token
    Unrecognized(String),
}

pub struct Tokenizer<'g> {
    grammar: &'g CompiledGrammar,
}

impl<'g> Tokenizer<'g> {
    pub fn new(grammar: &'g CompiledGrammar) -> Self {
        Self { grammar }
    }

    pub fn classify(&self, token: &str) -> Classified {
        if let Some(note_type) = self.grammar.literal(token) {
            log::debug!("{:?} -> {} (literal)", token, note_type);
            return Classified::Token(NoteToken::new(note_type));
        }

        for classifier in self.grammar.classifiers() {
            if let Some(caps) = classifier.captures(token) {
                let note = self.grammar.construct(classifier, &caps);
                log::debug!("{:?} -> {}", token, note);
                return Classified::Token(note);
            }
        }

        match self.grammar.fallback(token) {
            Some(Some(note_type)) => Classified::Token(NoteToken::new(note_type)),
            Some(None) => Classified::Ignored,
            None => Classified::Unrecognized(token.to_string()),
        }
    }

    /// Classify every whitespace-separated token of a text segment
    pub fn tokenize(&self, text: &str) -> Vec<TuneElement> {
        text.split_whitespace()
            .filter_map(|token| match self.classify(token) {
                Classified::Token(note) => Some(TuneElement::Note(note)),
                Classified::Ignored => None,
                Classified::Unrecognized(raw) => {
                    log::warn!("Unrecognized token {:?}, passing through", raw);
                    Some(TuneElement::Unparsed(raw))
                }
            })
            .collect()
    }
}
