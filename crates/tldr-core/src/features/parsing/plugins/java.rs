//! Java extractor (C2), grounded on tree-sitter-java.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, find_descendants_by_kind};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["method_declaration", "constructor_declaration"],
    class_kinds: &["class_declaration", "interface_declaration"],
    if_kinds: &["if_statement"],
    elif_kinds: &[],
    else_kinds: &[],
    while_kinds: &["while_statement"],
    for_kinds: &["for_statement", "enhanced_for_statement"],
    repeat_kinds: &["do_statement"],
    switch_kinds: &["switch_expression"],
    case_kinds: &["switch_block_statement_group", "switch_rule"],
    try_kinds: &["try_statement"],
    except_kinds: &["catch_clause"],
    return_kinds: &["return_statement"],
    break_kinds: &["break_statement"],
    continue_kinds: &["continue_statement"],
    raise_kinds: &["throw_statement"],
    call_kinds: &["method_invocation"],
    assignment_kinds: &["assignment_expression"],
    augmented_assignment_kinds: &[],
    identifier_kinds: &["identifier"],
    block_kinds: &["block"],
    parameter_kinds: &["formal_parameters"],
};

pub struct JavaPlugin;

impl JavaPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .expect("tree-sitter-java grammar should load");
        parser
    }
}

impl Default for JavaPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for JavaPlugin {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::Java);
        };
        let mut facts = extract_file_facts(tree.root_node(), source, file_path, Language::Java, &PROFILE);
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
        for node in find_descendants_by_kind(&root, "import_declaration") {
            let line = node.start_position().row as u32 + 1;
            let text = extract_node_text_owned(&node, source);
            let module = text
                .trim_start_matches("import")
                .trim_start_matches("static")
                .trim()
                .trim_end_matches(';')
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
    fn test_method_declaration() {
        let plugin = JavaPlugin::new();
        let source = "class Calc {\n    int add(int a, int b) {\n        return a + b;\n    }\n}\n";
        let facts = plugin.extract_facts(source, "Calc.java");
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.classes[0].name, "Calc");
        assert_eq!(facts.classes[0].methods.len(), 1);
        assert_eq!(facts.classes[0].methods[0].name, "add");
    }

    #[test]
    fn test_import_declaration() {
        let plugin = JavaPlugin::new();
        let source = "import java.util.List;\n\nclass A {}\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "java.util.List");
    }
}
