//! LilyPond rendering
//!
//! Converts a parsed `Tune` into a LilyPond document.

pub mod errors;
pub mod offset;
pub mod ornaments;
pub mod renderer;
pub mod templates;
pub mod types;

pub use errors::RenderError;
pub use ornaments::Pitch;
pub use renderer::LilyPondRenderer;
pub use templates::{escape_lilypond_string, TemplateContext};
pub use types::RenderSettings;

use crate::models::Tune;

/// Render a tune with the given settings
pub fn render_tune(tune: &Tune, settings: &RenderSettings) -> Result<String, RenderError> {
    LilyPondRenderer::new(settings.clone()).from_tune(tune)
}
