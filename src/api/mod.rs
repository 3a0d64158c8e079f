//! Bagpipe Transposer WASM API
//!
//! JavaScript-facing wrapper around the parse and render pipeline. A
//! `Transposer` owns its grammar registry and render settings; nothing is
//! kept in global state.

pub mod helpers;

use wasm_bindgen::prelude::*;

use crate::grammar::GrammarRegistry;
use crate::parse::TuneParser;
use crate::renderers::RenderSettings;
use crate::{wasm_error, wasm_info};

use helpers::{deserialize, js_error, serialize};

#[wasm_bindgen]
pub struct Transposer {
    registry: GrammarRegistry,
    settings: RenderSettings,
}

#[wasm_bindgen]
impl Transposer {
    /// Create a transposer with the bundled grammars
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Transposer, JsValue> {
        let registry = GrammarRegistry::builtin().map_err(|e| js_error("Bundled grammar error", e))?;
        wasm_info!("Transposer ready with formats: {}", registry.names().join(", "));
        Ok(Transposer {
            registry,
            settings: RenderSettings::default(),
        })
    }

    /// Load an additional grammar document (JSON). Returns its format name.
    #[wasm_bindgen(js_name = loadGrammar)]
    pub fn load_grammar(&mut self, grammar_json: &str) -> Result<String, JsValue> {
        let grammar = self
            .registry
            .load_json(grammar_json)
            .map_err(|e| js_error("Grammar load error", e))?;
        Ok(grammar.name().to_string())
    }

    /// Names of the loaded formats
    #[wasm_bindgen(js_name = formats)]
    pub fn formats(&self) -> Vec<String> {
        self.registry.names().into_iter().map(str::to_string).collect()
    }

    /// Format name for a file extension, if any grammar declares it
    #[wasm_bindgen(js_name = formatForExtension)]
    pub fn format_for_extension(&self, extension: &str) -> Option<String> {
        self.registry
            .by_extension(extension)
            .map(|g| g.name().to_string())
    }

    /// Replace the render settings (a `RenderSettings` object)
    #[wasm_bindgen(js_name = setSettings)]
    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.settings = deserialize(settings, "Settings parse error")?;
        Ok(())
    }

    /// Parse source text into a tune object
    #[wasm_bindgen(js_name = parse)]
    pub fn parse(&self, format: &str, source: &str) -> Result<JsValue, JsValue> {
        let grammar = self
            .registry
            .by_name(format)
            .or_else(|| self.registry.by_extension(format))
            .ok_or_else(|| js_error("Parse error", format!("unknown format '{}'", format)))?;
        let tune = TuneParser::new(grammar).parse(source);
        serialize(&tune, "Tune serialization error")
    }

    /// Parse and render source text to a LilyPond document
    #[wasm_bindgen(js_name = transpose)]
    pub fn transpose(&self, format: &str, source: &str) -> Result<String, JsValue> {
        let output = crate::transpose(&self.registry, format, source, &self.settings).map_err(|e| {
            wasm_error!("Transpose failed: {}", e);
            JsValue::from_str(&e.to_string())
        })?;
        wasm_info!("LilyPond generated: {} bytes", output.len());
        Ok(output)
    }
}
