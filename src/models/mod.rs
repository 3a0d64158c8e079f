//! Models module
//!
//! Data types shared by the parser and the renderer.

pub mod note_token;
pub mod tune;

// Re-export commonly used types
pub use note_token::{NoteToken, Value};
pub use tune::{HeaderField, Tune, TuneElement, SCALAR_FIELDS};
