//! Source parsing
//!
//! Converts raw source text into a `Tune` with one compiled grammar:
//! preprocess (line repair and headers), tokenize, post-process.

pub mod postprocess;
pub mod preprocess;
pub mod tokenizer;

use std::sync::Arc;

use crate::grammar::CompiledGrammar;
use crate::models::{Tune, TuneElement};

pub use preprocess::Segment;
pub use tokenizer::{Classified, Tokenizer};

/// Parser bound to one compiled grammar. Cheap to clone; the grammar is shared.
#[derive(Debug, Clone)]
pub struct TuneParser {
    grammar: Arc<CompiledGrammar>,
}

impl TuneParser {
    pub fn new(grammar: Arc<CompiledGrammar>) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    /// Parse a complete source buffer. Never fails: unrecognized tokens are
    /// kept as unparsed elements.
    pub fn parse(&self, source: &str) -> Tune {
        let tokenizer = Tokenizer::new(&self.grammar);
        let mut tune = Tune::new();
        let mut elements = Vec::new();

        for segment in preprocess::preprocess(&self.grammar, source) {
            match segment {
                Segment::Header(header) => {
                    if !tune.set_header(&header) {
                        elements.push(TuneElement::Inline(header));
                    }
                }
                Segment::Text(text) => elements.extend(tokenizer.tokenize(&text)),
            }
        }

        tune.notes = postprocess::postprocess(elements);
        if let Some(time) = postprocess::first_time_signature(&tune.notes) {
            tune.time = time;
        }

        log::info!(
            "Parsed {} tune '{}': {} elements, {} unparsed",
            self.grammar.name(),
            tune.title,
            tune.notes.len(),
            tune.unparsed().len()
        );
        tune
    }
}
