//! Grammar registry
//!
//! Holds every loaded grammar keyed by format name. Grammars are compiled
//! once and shared read-only between parsers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::compiler::CompiledGrammar;
use super::document::GrammarDocument;
use super::errors::GrammarError;

/// The Bagpipe Music Writer grammar shipped with the crate
pub const BUNDLED_BWW: &str = include_str!("../../resources/grammars/bagpipe_music_writer.json");

#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, Arc<CompiledGrammar>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled grammars
    pub fn builtin() -> Result<Self, GrammarError> {
        let mut registry = Self::new();
        registry.load_json(BUNDLED_BWW)?;
        Ok(registry)
    }

    /// Compile and register a grammar, replacing any grammar of the same name
    pub fn register(&mut self, grammar: CompiledGrammar) -> Arc<CompiledGrammar> {
        let name = grammar.name().to_string();
        let grammar = Arc::new(grammar);
        if self.grammars.insert(name.clone(), grammar.clone()).is_some() {
            log::warn!("Grammar '{}' replaced by a later definition", name);
        }
        grammar
    }

    pub fn load_json(&mut self, text: &str) -> Result<Arc<CompiledGrammar>, GrammarError> {
        let doc = GrammarDocument::from_json(text)?;
        Ok(self.register(CompiledGrammar::compile(&doc)?))
    }

    pub fn load_yaml(&mut self, text: &str) -> Result<Arc<CompiledGrammar>, GrammarError> {
        let doc = GrammarDocument::from_yaml(text)?;
        Ok(self.register(CompiledGrammar::compile(&doc)?))
    }

    /// Load one grammar file, choosing the reader by extension
    pub fn load_file(&mut self, path: &Path) -> Result<Arc<CompiledGrammar>, GrammarError> {
        let text = std::fs::read_to_string(path)?;
        match extension_of(path).as_deref() {
            Some("yaml") | Some("yml") => self.load_yaml(&text),
            _ => self.load_json(&text),
        }
    }

    /// Load every `.json`, `.yaml` and `.yml` file in a directory.
    ///
    /// A document that fails to load is logged and skipped. Returns the
    /// number of grammars loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, GrammarError> {
        let mut paths = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    extension_of(p).as_deref(),
                    Some("json") | Some("yaml") | Some("yml")
                )
            })
            .collect::<Vec<_>>();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path) {
                Ok(grammar) => {
                    log::info!("Loaded grammar '{}' from {}", grammar.name(), path.display());
                    loaded += 1;
                }
                Err(e) => log::warn!("Skipping grammar {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<CompiledGrammar>> {
        self.grammars.get(name).cloned()
    }

    /// First grammar (by name) that declares the extension
    pub fn by_extension(&self, extension: &str) -> Option<Arc<CompiledGrammar>> {
        let wanted = extension.trim_start_matches('.').to_lowercase();
        self.grammars
            .values()
            .find(|g| {
                g.info
                    .extensions
                    .iter()
                    .any(|e| e.trim_start_matches('.').to_lowercase() == wanted)
            })
            .cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.grammars.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static RECORDS: Lazy<Mutex<Vec<(log::Level, String)>>> = Lazy::new(|| Mutex::new(Vec::new()));

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    #[test]
    fn test_builtin_has_bww() {
        let registry = GrammarRegistry::builtin().unwrap();
        assert_eq!(registry.names(), vec!["BagpipeMusicWriter"]);
        assert!(registry.by_extension("bww").is_some());
        assert!(registry.by_extension(".BWW").is_some());
        assert!(registry.by_extension("abc").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = GrammarRegistry::new();
        registry
            .load_json(r#"{"_docstring": {"FormatName": "X"}, "bar": "!"}"#)
            .unwrap();
        registry
            .load_json(r#"{"_docstring": {"FormatName": "X"}, "bar": "|"}"#)
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.by_name("X").unwrap().literal("|"), Some("bar"));
    }

    #[test]
    fn test_skipped_document_logs_warning() {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("unbalanced.json"),
            r#"{"_docstring": {"FormatName": "Unbalanced"}, "double": "db{{nowhere}}"}"#,
        )
        .unwrap();

        let mut registry = GrammarRegistry::new();
        assert_eq!(registry.load_dir(dir.path()).unwrap(), 0);

        let records = RECORDS.lock().unwrap();
        let skipped: Vec<_> = records
            .iter()
            .filter(|(_, message)| message.contains("unbalanced.json"))
            .collect();
        assert!(!skipped.is_empty());
        assert!(skipped.iter().all(|(level, _)| *level == log::Level::Warn));
    }
}
