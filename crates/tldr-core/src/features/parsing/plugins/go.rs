//! Go extractor (C2), grounded on tree-sitter-go.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, find_descendants_by_kind};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["function_declaration", "method_declaration"],
    class_kinds: &[],
    if_kinds: &["if_statement"],
    elif_kinds: &[],
    else_kinds: &[],
    while_kinds: &[],
    for_kinds: &["for_statement"],
    repeat_kinds: &[],
    switch_kinds: &["expression_switch_statement", "type_switch_statement"],
    case_kinds: &["expression_case", "type_case", "default_case"],
    try_kinds: &[],
    except_kinds: &[],
    return_kinds: &["return_statement"],
    break_kinds: &["break_statement"],
    continue_kinds: &["continue_statement"],
    raise_kinds: &[],
    call_kinds: &["call_expression"],
    assignment_kinds: &["assignment_statement"],
    augmented_assignment_kinds: &[],
    identifier_kinds: &["identifier", "field_identifier"],
    block_kinds: &["block"],
    parameter_kinds: &["parameter_list"],
};

pub struct GoPlugin;

impl GoPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::language())
            .expect("tree-sitter-go grammar should load");
        parser
    }
}

impl Default for GoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for GoPlugin {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::Go);
        };
        let mut facts = extract_file_facts(tree.root_node(), source, file_path, Language::Go, &PROFILE);
        facts.imports = self.parse_imports(source);
        facts
    }

    fn parse_imports(&self, source: &str) -> Vec<ImportFact> {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return Vec::new();
        };
        let root = tree.root_node();
        let mut imports = Vec::new();
        for spec in find_descendants_by_kind(&root, "import_spec") {
            let line = spec.start_position().row as u32 + 1;
            if let Some(path_node) = crate::shared::utils::tree_sitter::find_child_by_kind(&spec, "interpreted_string_literal") {
                let raw = extract_node_text_owned(&path_node, source);
                let module = raw.trim_matches('"').to_string();
                imports.push(ImportFact::new(ImportKind::Import, module, line));
            }
        }
        imports
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
    fn test_function_declaration() {
        let plugin = GoPlugin::new();
        let source = "package main\n\nfunc add(a int, b int) int {\n    return a + b\n}\n";
        let facts = plugin.extract_facts(source, "main.go");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
        assert_eq!(facts.functions[0].params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_import_spec() {
        let plugin = GoPlugin::new();
        let source = "package main\n\nimport \"fmt\"\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "fmt");
    }
}
