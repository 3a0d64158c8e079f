//! Grammar compilation
//!
//! Turns a `GrammarDocument` into the runtime matchers the tokenizer uses:
//!
//! 1. literal tokens (placeholder-free definitions), looked up exactly
//! 2. base-type and compound pattern classifiers, in document order
//! 3. modifier classifiers, which embed a target's pattern in a larger one
//!    and merge a modifier set into the produced token
//!
//! The first matching classifier wins, so this registration order is part of
//! the grammar's meaning.
//!
//! Placeholders (`{{key}}`, `{{key:index}}`) are resolved by key with a
//! memoized, cycle-checked walk, so the compiled output does not depend on
//! the order keys appear in the document.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::document::{FormatInfo, GrammarDocument, ModifierDef, BASE_TYPES};
use super::errors::GrammarError;
use crate::models::NoteToken;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]*)\}\}").expect("placeholder pattern is valid"));

/// Placeholder standing for the modifier's target inside a modifier pattern
const ITEM: &str = "{{item}}";

pub fn has_placeholder(pattern: &str) -> bool {
    PLACEHOLDER.is_match(pattern)
}

/// Split `key:index` into the referenced key and its capture-group name
fn split_placeholder(inner: &str) -> (&str, String) {
    match inner.split_once(':') {
        Some((key, index)) => (key.trim(), format!("{}_{}", key.trim(), index.trim())),
        None => (inner.trim(), inner.trim().to_string()),
    }
}

/// Modifier set merged into a token produced by a modifier classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierUpdate {
    pub name: String,
    fixed: BTreeMap<String, Value>,
    selectors: BTreeMap<String, Map<String, Value>>,
}

impl ModifierUpdate {
    fn from_def(def: &ModifierDef) -> Self {
        let mut fixed = BTreeMap::new();
        let mut selectors = BTreeMap::new();
        for (k, v) in &def.modify {
            match v {
                Value::Object(table) => {
                    selectors.insert(k.clone(), table.clone());
                }
                other => {
                    fixed.insert(k.clone(), other.clone());
                }
            }
        }
        Self {
            name: def.name.clone(),
            fixed,
            selectors,
        }
    }

    /// Whether a capture group only selects modifiers (and is not an argument)
    pub fn consumes(&self, group: &str) -> bool {
        self.selectors.contains_key(group)
    }

    pub fn apply(&self, caps: &Captures, token: &mut NoteToken) {
        token.add_modifiers(&self.fixed);
        for (group, table) in &self.selectors {
            let Some(selected) = caps.name(group) else {
                continue;
            };
            match table.get(selected.as_str()) {
                Some(Value::Object(entries)) => {
                    for (k, v) in entries {
                        token.modifiers.insert(k.clone(), v.clone());
                    }
                }
                Some(value) => {
                    token.modifiers.insert(group.clone(), value.clone());
                }
                None => log::debug!(
                    "Modifier '{}' has no entry for {}={:?}",
                    self.name,
                    group,
                    selected.as_str()
                ),
            }
        }
    }
}

/// An ordered classifier: a full-match pattern and the type it produces
#[derive(Debug, Clone)]
pub struct Classifier {
    target: String,
    matcher: Regex,
    update: Option<ModifierUpdate>,
}

impl Classifier {
    fn compile(
        target: &str,
        expanded: &str,
        update: Option<ModifierUpdate>,
    ) -> Result<Self, GrammarError> {
        let matcher = Regex::new(&format!("^(?:{})$", expanded)).map_err(|source| {
            GrammarError::InvalidPattern {
                pattern: expanded.to_string(),
                source,
            }
        })?;
        log::debug!("Registered classifier {} <- {}", target, matcher.as_str());
        Ok(Self {
            target: target.to_string(),
            matcher,
            update,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn is_modifier(&self) -> bool {
        self.update.is_some()
    }

    pub fn update(&self) -> Option<&ModifierUpdate> {
        self.update.as_ref()
    }

    /// Full-match the token against this classifier
    pub fn captures<'t>(&self, token: &'t str) -> Option<Captures<'t>> {
        self.matcher.captures(token)
    }

    /// Capture-group names in pattern order
    fn group_names(&self) -> impl Iterator<Item = &str> {
        self.matcher.capture_names().flatten()
    }
}

/// A compiled header extraction rule (searched, not anchored)
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    pub field: Option<String>,
    matcher: Regex,
}

impl HeaderMatcher {
    pub fn find<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.matcher.captures(text)
    }

    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }
}

struct Resolver<'a> {
    doc: &'a GrammarDocument,
    aliases: HashMap<String, String>,
    cache: HashMap<String, String>,
    visiting: Vec<String>,
    group_tables: HashMap<String, String>,
}

impl<'a> Resolver<'a> {
    fn new(doc: &'a GrammarDocument, aliases: HashMap<String, String>) -> Self {
        Self {
            doc,
            aliases,
            cache: HashMap::new(),
            visiting: Vec::new(),
            group_tables: HashMap::new(),
        }
    }

    /// Table actually backing a placeholder key, following base-type fallbacks
    fn table_key(&self, key: &str) -> Option<String> {
        if self.doc.table(key).is_some() {
            return Some(key.to_string());
        }
        self.aliases.get(key).cloned()
    }

    /// Replace every placeholder in a pattern with its regex fragment
    fn expand(&mut self, pattern: &str) -> Result<String, GrammarError> {
        let mut out = String::with_capacity(pattern.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(pattern) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&pattern[last..whole.start()]);
            out.push_str(&self.fragment(inner.as_str(), pattern)?);
            last = whole.end();
        }
        out.push_str(&pattern[last..]);
        Ok(out)
    }

    fn fragment(&mut self, inner: &str, pattern: &str) -> Result<String, GrammarError> {
        let (key, group) = split_placeholder(inner);

        if let Some(table_key) = self.table_key(key) {
            let alternatives = self
                .doc
                .table(&table_key)
                .map(|t| t.sources().map(regex::escape).collect::<Vec<_>>().join("|"))
                .unwrap_or_default();
            self.group_tables.insert(group.clone(), table_key);
            return Ok(format!("(?P<{}>{})", group, alternatives));
        }

        if let Some(patterns) = self.doc.dynamic(key) {
            let patterns = patterns.to_vec();
            if patterns.iter().any(|p| has_placeholder(p)) {
                return self.resolve_key(key, &patterns, false);
            }
            return Ok(format!("(?P<{}>{})", group, patterns.join("|")));
        }

        if let Some(patterns) = self.doc.definition(key) {
            let patterns = patterns.to_vec();
            return self.resolve_key(key, &patterns, true);
        }

        Err(GrammarError::UndefinedGrammarReference {
            key: key.to_string(),
            pattern: pattern.to_string(),
        })
    }

    /// Memoized expansion of a named definition, with cycle detection
    fn resolve_key(
        &mut self,
        key: &str,
        patterns: &[String],
        escape_literals: bool,
    ) -> Result<String, GrammarError> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached.clone());
        }
        if self.visiting.iter().any(|k| k == key) {
            return Err(GrammarError::CyclicReference {
                key: key.to_string(),
            });
        }
        self.visiting.push(key.to_string());
        let result = self.alternatives(patterns, escape_literals);
        self.visiting.pop();
        let resolved = result?;
        self.cache.insert(key.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn alternatives(
        &mut self,
        patterns: &[String],
        escape_literals: bool,
    ) -> Result<String, GrammarError> {
        let mut parts = Vec::with_capacity(patterns.len());
        for p in patterns {
            if has_placeholder(p) {
                parts.push(self.expand(p)?);
            } else if escape_literals {
                parts.push(regex::escape(p));
            } else {
                parts.push(p.clone());
            }
        }
        Ok(format!("(?:{})", parts.join("|")))
    }

    /// The pattern a modifier wraps for `target`
    fn target_fragment(&mut self, target: &str, pattern: &str) -> Result<String, GrammarError> {
        if let Some(patterns) = self.doc.definition(target) {
            let patterns = patterns.to_vec();
            return self.resolve_key(target, &patterns, true);
        }
        if let Some(patterns) = self.doc.dynamic(target) {
            let patterns = patterns.to_vec();
            return self.alternatives(&patterns, false);
        }
        Err(GrammarError::UndefinedGrammarReference {
            key: target.to_string(),
            pattern: pattern.to_string(),
        })
    }
}

/// Missing base tables fall back to the nearest earlier base table
fn base_table_aliases(doc: &GrammarDocument) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    let mut previous: Option<&str> = None;
    for &base in BASE_TYPES {
        if doc.table(base).is_some() {
            previous = Some(base);
            continue;
        }
        match previous {
            Some(prev) => {
                log::warn!(
                    "Grammar '{}' has no definition for {}, falling back to {}",
                    doc.info.name,
                    base,
                    prev
                );
                log::warn!(
                    "If {} and {} are supposed to be different, this is a problem.",
                    base,
                    prev
                );
                aliases.insert(base.to_string(), prev.to_string());
            }
            None => log::warn!("Grammar '{}' has no base table {}", doc.info.name, base),
        }
    }
    aliases
}

/// The runtime form of a grammar document. Immutable once built.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub info: FormatInfo,
    literals: HashMap<String, String>,
    classifiers: Vec<Classifier>,
    group_tables: HashMap<String, String>,
    tables: HashMap<String, HashMap<String, String>>,
    headers: Vec<HeaderMatcher>,
    postprocess: HashMap<String, Option<String>>,
}

impl CompiledGrammar {
    pub fn from_json(text: &str) -> Result<Self, GrammarError> {
        Self::compile(&GrammarDocument::from_json(text)?)
    }

    pub fn compile(doc: &GrammarDocument) -> Result<Self, GrammarError> {
        let mut resolver = Resolver::new(doc, base_table_aliases(doc));

        let mut literals = HashMap::new();
        for (key, patterns) in &doc.definitions {
            for literal in patterns.iter().filter(|p| !has_placeholder(p)) {
                literals
                    .entry(literal.clone())
                    .or_insert_with(|| key.clone());
            }
        }

        let mut classifiers = Vec::new();
        for (key, patterns) in &doc.dynamic {
            if !BASE_TYPES.contains(&key.as_str()) {
                continue;
            }
            for p in patterns {
                let expanded = resolver.expand(p)?;
                classifiers.push(Classifier::compile(key, &expanded, None)?);
            }
        }
        for (key, patterns) in &doc.definitions {
            for p in patterns.iter().filter(|p| has_placeholder(p)) {
                let expanded = resolver.expand(p)?;
                classifiers.push(Classifier::compile(key, &expanded, None)?);
            }
        }

        for def in &doc.modifiers {
            let update = ModifierUpdate::from_def(def);
            for target in &def.applies {
                let target_fragment = resolver.target_fragment(target, &def.pattern)?;
                let pieces = def
                    .pattern
                    .split(ITEM)
                    .map(|piece| resolver.expand(piece))
                    .collect::<Result<Vec<_>, _>>()?;
                let expanded = pieces.join(&target_fragment);
                classifiers.push(Classifier::compile(target, &expanded, Some(update.clone()))?);
            }
        }

        let mut headers = Vec::with_capacity(doc.info.headers.len());
        for rule in &doc.info.headers {
            let expanded = resolver.expand(&rule.pattern)?;
            let matcher = Regex::new(&expanded).map_err(|source| GrammarError::InvalidPattern {
                pattern: expanded.clone(),
                source,
            })?;
            if let Some(field) = &rule.field {
                if !matcher.capture_names().flatten().any(|n| n == field) {
                    log::warn!(
                        "Header rule for '{}' has no capture group of that name: {}",
                        field,
                        rule.pattern
                    );
                }
            }
            headers.push(HeaderMatcher {
                field: rule.field.clone(),
                matcher,
            });
        }

        let tables = doc
            .tables
            .iter()
            .map(|(name, table)| {
                let reverse = table
                    .entries
                    .iter()
                    .flat_map(|(canonical, sources)| {
                        sources.iter().map(move |s| (s.clone(), canonical.clone()))
                    })
                    .collect::<HashMap<_, _>>();
                (name.clone(), reverse)
            })
            .collect();

        let postprocess = doc.postprocess.iter().cloned().collect();

        log::info!(
            "Compiled grammar '{}' {}: {} literals, {} classifiers, {} header rules",
            doc.info.name,
            doc.info.version,
            literals.len(),
            classifiers.len(),
            headers.len()
        );

        Ok(Self {
            info: doc.info.clone(),
            literals,
            classifiers,
            group_tables: resolver.group_tables,
            tables,
            headers,
            postprocess,
        })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Type produced by an exact literal token
    pub fn literal(&self, token: &str) -> Option<&str> {
        self.literals.get(token).map(String::as_str)
    }

    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }

    pub fn header_matchers(&self) -> &[HeaderMatcher] {
        &self.headers
    }

    /// Postprocess fallback: `Some(Some(type))` maps, `Some(None)` ignores
    pub fn fallback(&self, token: &str) -> Option<Option<&str>> {
        self.postprocess.get(token).map(|t| t.as_deref())
    }

    /// Resolve a captured value through the lookup table its group came from
    pub fn resolve(&self, group: &str, value: &str) -> String {
        self.group_tables
            .get(group)
            .and_then(|table| self.tables.get(table))
            .and_then(|reverse| reverse.get(value))
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }

    /// Build the note token for a classifier match
    pub fn construct(&self, classifier: &Classifier, caps: &Captures) -> NoteToken {
        let mut token = NoteToken::new(classifier.target());
        for name in classifier.group_names() {
            if classifier.update().map_or(false, |u| u.consumes(name)) {
                continue;
            }
            if let Some(m) = caps.name(name) {
                token.push_argument(name, Value::String(self.resolve(name, m.as_str())));
            }
        }
        if let Some(update) = classifier.update() {
            update.apply(caps, &mut token);
        }
        token
    }
}
