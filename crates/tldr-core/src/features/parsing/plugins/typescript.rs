//! TypeScript extractor (C2). The TypeScript grammar is a superset of the
//! JavaScript one for the node kinds this crate cares about (functions,
//! classes, calls, CommonJS-style exports), so this plugin reuses the
//! JavaScript extraction logic wholesale and only swaps the grammar and the
//! reported language tag.

use crate::shared::models::{FileFacts, ImportFact, PDGInfo};
use crate::shared::ports::language::Language;

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};
use super::javascript::{extract_commonjs_style, extract_imports_generic, PROFILE};

pub struct TypeScriptPlugin;

impl TypeScriptPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> tree_sitter::Parser {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_typescript::language_typescript())
            .expect("tree-sitter-typescript grammar should load");
        parser
    }
}

impl Default for TypeScriptPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for TypeScriptPlugin {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::TypeScript);
        };
        let root = tree.root_node();
        let mut facts = extract_file_facts(root, source, file_path, Language::TypeScript, &PROFILE);
        extract_commonjs_style(&root, source, Language::TypeScript, file_path, &mut facts);
        facts.imports = extract_imports_generic(&root, source);
        facts
    }

    fn parse_imports(&self, source: &str) -> Vec<ImportFact> {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return Vec::new();
        };
        extract_imports_generic(&tree.root_node(), source)
    }

    fn syntax_profile(&self) -> Option<&SyntaxProfile> {
        Some(&PROFILE)
    }

    fn build_pdgs(&self, source: &str) -> Vec<PDGInfo> {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return Vec::new();
        };
        let cfgs = crate::features::flow_graph::build_cfgs_for_tree(tree.root_node(), source, &PROFILE);
        let dfgs = crate::features::data_flow::build_dfgs_for_tree(tree.root_node(), source, &PROFILE);
        cfgs.into_iter()
            .zip(dfgs)
            .map(|(cfg, dfg)| crate::features::pdg::build_pdg(cfg, dfg))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_function() {
        let plugin = TypeScriptPlugin::new();
        let source = "function add(a: number, b: number): number {\n    return a + b;\n}\n";
        let facts = plugin.extract_facts(source, "math.ts");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
    }

    #[test]
    fn test_interface_does_not_become_a_class() {
        let plugin = TypeScriptPlugin::new();
        let source = "interface Point {\n    x: number;\n    y: number;\n}\n";
        let facts = plugin.extract_facts(source, "point.ts");
        assert!(facts.classes.is_empty());
    }
}
