//! Grammar documents and their compiled classifiers

pub mod compiler;
pub mod document;
pub mod errors;
pub mod registry;

pub use compiler::{Classifier, CompiledGrammar, HeaderMatcher, ModifierUpdate};
pub use document::{FormatInfo, GrammarDocument, HeaderRule, LookupTable, ModifierDef};
pub use errors::GrammarError;
pub use registry::GrammarRegistry;
