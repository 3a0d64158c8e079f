//! Bagpipe Transposer
//!
//! Converts line-oriented bagpipe notation into LilyPond. A declarative
//! grammar document is compiled into ordered token classifiers; the parser
//! uses them to build a `Tune`, and the LilyPond renderer walks the tune to
//! produce a document.
//!
//! ```rust,ignore
//! let registry = GrammarRegistry::builtin()?;
//! let lilypond = transpose(&registry, "bww", source, &RenderSettings::default())?;
//! ```

pub mod api;
pub mod grammar;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod renderers;

// Re-export commonly used types
pub use grammar::{CompiledGrammar, GrammarError, GrammarRegistry};
pub use models::{HeaderField, NoteToken, Tune, TuneElement, Value};
pub use parse::TuneParser;
pub use pipeline::{transpose, TransposeError};
pub use renderers::{LilyPondRenderer, RenderError, RenderSettings};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }

    log::info!("Bagpipe Transposer WASM module initialized");
}
