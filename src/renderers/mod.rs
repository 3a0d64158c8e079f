//! Renderers module
//!
//! Output formats a parsed tune can be rendered to.

pub mod lilypond;

pub use lilypond::{render_tune, LilyPondRenderer, RenderError, RenderSettings};
