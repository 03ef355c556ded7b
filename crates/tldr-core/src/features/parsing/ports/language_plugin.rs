//! The per-language extraction contract (C1/C2): every language implements
//! `extract_facts` and `parse_imports`; grammar-backed languages also expose
//! a `SyntaxProfile` so the generic CFG/DFG/PDG builders in
//! `features::flow_graph`, `features::data_flow`, and `features::pdg` can
//! walk their trees without per-language duplication of the graph
//! algorithms themselves.

use std::collections::HashMap;

use crate::shared::models::{FileFacts, ImportFact, PDGInfo};
use crate::shared::ports::language::Language;

/// Maps a grammar's concrete node-kind strings onto the syntactic roles the
/// generic CFG/DFG builders need to recognise. Every language that has a
/// tree-sitter grammar wired up provides one of these; languages on the
/// regex-fallback path do not, and degrade to a trivial single-block CFG.
#[derive(Debug, Clone, Default)]
pub struct SyntaxProfile {
    pub function_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub if_kinds: &'static [&'static str],
    pub elif_kinds: &'static [&'static str],
    pub else_kinds: &'static [&'static str],
    pub while_kinds: &'static [&'static str],
    pub for_kinds: &'static [&'static str],
    pub repeat_kinds: &'static [&'static str],
    pub switch_kinds: &'static [&'static str],
    pub case_kinds: &'static [&'static str],
    pub try_kinds: &'static [&'static str],
    pub except_kinds: &'static [&'static str],
    pub return_kinds: &'static [&'static str],
    pub break_kinds: &'static [&'static str],
    pub continue_kinds: &'static [&'static str],
    pub raise_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    pub assignment_kinds: &'static [&'static str],
    pub augmented_assignment_kinds: &'static [&'static str],
    pub identifier_kinds: &'static [&'static str],
    pub block_kinds: &'static [&'static str],
    pub parameter_kinds: &'static [&'static str],
}

impl SyntaxProfile {
    pub fn is_kind(set: &[&str], kind: &str) -> bool {
        set.contains(&kind)
    }
}

/// Tracks nested scope names so a plugin can build fully-qualified names
/// for nested functions/methods without recursing.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext<'a> {
    pub source: &'a str,
    pub file_path: &'a str,
    pub scope_stack: Vec<String>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(source: &'a str, file_path: &'a str) -> Self {
        Self {
            source,
            file_path,
            scope_stack: Vec::new(),
        }
    }

    pub fn fqn_prefix(&self) -> String {
        self.scope_stack.join(".")
    }

    pub fn push_scope(&mut self, name: impl Into<String>) {
        self.scope_stack.push(name.into());
    }

    pub fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }
}

/// The two-method contract every language must implement, plus the optional
/// syntax profile that unlocks the generic CFG/DFG/PDG builders. A language
/// that lacks a real parser degrades via the regex-fallback extractor (see
/// `plugins::regex_fallback`), which also implements this trait.
pub trait LanguagePlugin: Send + Sync {
    fn language(&self) -> Language;

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts;

    fn parse_imports(&self, source: &str) -> Vec<ImportFact>;

    /// A grammar-backed plugin returns its syntax profile so the generic
    /// graph builders can walk its tree; the fallback path returns `None`
    /// and callers fall back to `CFGInfo::trivial`.
    fn syntax_profile(&self) -> Option<&SyntaxProfile> {
        None
    }

    /// Builds one PDG per function found in `source`, for daemon commands
    /// (`cfg`, `dfg`, `slice`) that need a full graph rather than just facts.
    /// The fallback path (no grammar, no profile) degrades to no functions
    /// rather than a trivial single-block PDG, since there's no tree to walk.
    fn build_pdgs(&self, _source: &str) -> Vec<PDGInfo> {
        Vec::new()
    }
}

/// Owns one plugin per language and dispatches by extension or by `Language`.
pub struct LanguageRegistry {
    plugins: HashMap<Language, Box<dyn LanguagePlugin>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn LanguagePlugin>) {
        self.plugins.insert(plugin.language(), plugin);
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguagePlugin> {
        self.plugins.get(&language).map(|b| b.as_ref())
    }

    pub fn get_by_path(&self, path: &str) -> Option<&dyn LanguagePlugin> {
        Language::from_file_path(path).and_then(|lang| self.get(lang))
    }

    pub fn supports(&self, language: Language) -> bool {
        self.plugins.contains_key(&language)
    }

    pub fn all(&self) -> impl Iterator<Item = &Box<dyn LanguagePlugin>> {
        self.plugins.values()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_context_fqn() {
        let mut ctx = ExtractionContext::new("src", "f.py");
        ctx.push_scope("Outer");
        ctx.push_scope("inner");
        assert_eq!(ctx.fqn_prefix(), "Outer.inner");
        ctx.pop_scope();
        assert_eq!(ctx.fqn_prefix(), "Outer");
    }
}
