//! Kotlin extractor (C2), grounded on tree-sitter-kotlin.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, find_descendants_by_kind};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["function_declaration"],
    class_kinds: &["class_declaration", "object_declaration"],
    if_kinds: &["if_expression"],
    elif_kinds: &[],
    else_kinds: &[],
    while_kinds: &["while_statement"],
    for_kinds: &["for_statement"],
    repeat_kinds: &[],
    switch_kinds: &["when_expression"],
    case_kinds: &["when_entry"],
    try_kinds: &["try_expression"],
    except_kinds: &["catch_block"],
    return_kinds: &["jump_expression"],
    break_kinds: &[],
    continue_kinds: &[],
    raise_kinds: &[],
    call_kinds: &["call_expression"],
    assignment_kinds: &["assignment"],
    augmented_assignment_kinds: &[],
    identifier_kinds: &["simple_identifier"],
    block_kinds: &["function_body"],
    parameter_kinds: &["function_value_parameters"],
};

pub struct KotlinPlugin;

impl KotlinPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_kotlin::language())
            .expect("tree-sitter-kotlin grammar should load");
        parser
    }
}

impl Default for KotlinPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for KotlinPlugin {
    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::Kotlin);
        };
        let mut facts = extract_file_facts(tree.root_node(), source, file_path, Language::Kotlin, &PROFILE);
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
        for node in find_descendants_by_kind(&root, "import_header") {
            let line = node.start_position().row as u32 + 1;
            let module = extract_node_text_owned(&node, source)
                .trim_start_matches("import")
                .trim()
                .to_string();
            imports.push(ImportFact::new(ImportKind::Import, module, line));
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
        let plugin = KotlinPlugin::new();
        let source = "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n";
        let facts = plugin.extract_facts(source, "Math.kt");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
    }

    #[test]
    fn test_import_header() {
        let plugin = KotlinPlugin::new();
        let source = "import kotlin.collections.List\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "kotlin.collections.List");
    }
}
