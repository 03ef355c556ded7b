//! Rust extractor (C2), grounded on tree-sitter-rust. `impl_item` blocks are
//! treated as the class container so methods group under the type they're
//! implemented for.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, find_child_by_kind, find_descendants_by_kind};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["function_item"],
    class_kinds: &["impl_item"],
    if_kinds: &["if_expression"],
    elif_kinds: &[],
    else_kinds: &["else_clause"],
    while_kinds: &["while_expression"],
    for_kinds: &["for_expression"],
    repeat_kinds: &["loop_expression"],
    switch_kinds: &["match_expression"],
    case_kinds: &["match_arm"],
    try_kinds: &[],
    except_kinds: &[],
    return_kinds: &["return_expression"],
    break_kinds: &["break_expression"],
    continue_kinds: &["continue_expression"],
    raise_kinds: &["panic"],
    call_kinds: &["call_expression"],
    assignment_kinds: &["assignment_expression"],
    augmented_assignment_kinds: &["compound_assignment_expr"],
    identifier_kinds: &["identifier", "type_identifier", "field_identifier"],
    block_kinds: &["block"],
    parameter_kinds: &["parameters"],
};

pub struct RustPlugin;

impl RustPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::language())
            .expect("tree-sitter-rust grammar should load");
        parser
    }
}

impl Default for RustPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for RustPlugin {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::Rust);
        };
        let mut facts = extract_file_facts(tree.root_node(), source, file_path, Language::Rust, &PROFILE);
        // impl_item has no single `identifier` child to name it; use the type it implements for.
        let root = tree.root_node();
        for (class_node, class_fact) in find_descendants_by_kind(&root, "impl_item")
            .into_iter()
            .zip(facts.classes.iter_mut())
        {
            if let Some(type_node) = find_child_by_kind(&class_node, "type_identifier") {
                class_fact.name = extract_node_text_owned(&type_node, source);
            }
        }
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
        for node in find_descendants_by_kind(&root, "use_declaration") {
            let line = node.start_position().row as u32 + 1;
            let module = extract_node_text_owned(&node, source)
                .trim_start_matches("use ")
                .trim_end_matches(';')
                .to_string();
            imports.push(ImportFact::new(ImportKind::Use, module, line));
        }
        for node in find_descendants_by_kind(&root, "extern_crate_declaration") {
            let line = node.start_position().row as u32 + 1;
            if let Some(name) = find_child_by_kind(&node, "identifier") {
                imports.push(ImportFact::new(
                    ImportKind::ExternCrate,
                    extract_node_text_owned(&name, source),
                    line,
                ));
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
    fn test_function_item() {
        let plugin = RustPlugin::new();
        let source = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        let facts = plugin.extract_facts(source, "lib.rs");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
    }

    #[test]
    fn test_impl_block_groups_methods() {
        let plugin = RustPlugin::new();
        let source = "struct Foo;\nimpl Foo {\n    fn bar(&self) {}\n}\n";
        let facts = plugin.extract_facts(source, "foo.rs");
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.classes[0].name, "Foo");
        assert_eq!(facts.classes[0].methods.len(), 1);
    }

    #[test]
    fn test_use_declaration() {
        let plugin = RustPlugin::new();
        let source = "use std::collections::HashMap;\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::Use);
        assert!(imports[0].module.contains("HashMap"));
    }
}
