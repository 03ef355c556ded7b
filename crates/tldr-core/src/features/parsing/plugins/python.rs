//! Python extractor (C2), grounded on tree-sitter-python.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{
    extract_docstring, extract_node_text_owned, find_block_child, find_child_by_kind,
    find_descendants_by_kind, is_async_definition,
};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

pub(crate) const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["function_definition"],
    class_kinds: &["class_definition"],
    if_kinds: &["if_statement"],
    elif_kinds: &["elif_clause"],
    else_kinds: &["else_clause"],
    while_kinds: &["while_statement"],
    for_kinds: &["for_statement"],
    repeat_kinds: &[],
    switch_kinds: &["match_statement"],
    case_kinds: &["case_clause"],
    try_kinds: &["try_statement"],
    except_kinds: &["except_clause"],
    return_kinds: &["return_statement"],
    break_kinds: &["break_statement"],
    continue_kinds: &["continue_statement"],
    raise_kinds: &["raise_statement"],
    call_kinds: &["call"],
    assignment_kinds: &["assignment"],
    augmented_assignment_kinds: &["augmented_assignment"],
    identifier_kinds: &["identifier"],
    block_kinds: &["block"],
    parameter_kinds: &["parameters"],
};

pub struct PythonPlugin;

impl PythonPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .expect("tree-sitter-python grammar should load");
        parser
    }
}

impl Default for PythonPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for PythonPlugin {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let tree = match parser.parse(source, None) {
            Some(t) => t,
            None => return FileFacts::empty(file_path.to_string(), String::new(), Language::Python),
        };
        let root = tree.root_node();
        let mut facts = extract_file_facts(root, source, file_path, Language::Python, &PROFILE);

        // Docstrings aren't part of the generic profile; attach them here.
        for func_node in find_descendants_by_kind(&root, "function_definition") {
            let Some(name_node) = find_child_by_kind(&func_node, "identifier") else {
                continue;
            };
            let name = extract_node_text_owned(&name_node, source);
            let Some(block) = find_block_child(&func_node) else {
                continue;
            };
            let doc = extract_docstring(&block, source);
            let is_async = is_async_definition(&func_node, source);
            for f in facts.functions.iter_mut().chain(
                facts
                    .classes
                    .iter_mut()
                    .flat_map(|c| c.methods.iter_mut()),
            ) {
                if f.name == name && f.start_line == func_node.start_position().row as u32 + 1 {
                    f.docstring = doc.clone();
                    f.is_async = is_async;
                }
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

        for node in find_descendants_by_kind(&root, "import_statement") {
            let line = node.start_position().row as u32 + 1;
            for name_node in find_descendants_by_kind(&node, "dotted_name") {
                let module = extract_node_text_owned(&name_node, source);
                imports.push(ImportFact::new(ImportKind::Import, module, line));
            }
        }

        for node in find_descendants_by_kind(&root, "import_from_statement") {
            let line = node.start_position().row as u32 + 1;
            let module = find_child_by_kind(&node, "dotted_name")
                .or_else(|| find_child_by_kind(&node, "relative_import"))
                .map(|n| extract_node_text_owned(&n, source))
                .unwrap_or_default();
            let mut fact = ImportFact::new(ImportKind::FromImport, module, line);
            if let Some(names) = find_child_by_kind(&node, "import_list") {
                if let Some(first) = find_child_by_kind(&names, "dotted_name") {
                    fact.name = Some(extract_node_text_owned(&first, source));
                }
            }
            imports.push(fact);
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
    fn test_extract_simple_function() {
        let plugin = PythonPlugin::new();
        let source = "def greet(name):\n    \"\"\"Say hi.\"\"\"\n    return name\n";
        let facts = plugin.extract_facts(source, "greet.py");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "greet");
        assert_eq!(facts.functions[0].params, vec!["name".to_string()]);
        assert_eq!(facts.functions[0].docstring.as_deref(), Some("Say hi."));
    }

    #[test]
    fn test_extract_class_with_methods() {
        let plugin = PythonPlugin::new();
        let source = "class Greeter:\n    def hello(self):\n        return 1\n";
        let facts = plugin.extract_facts(source, "g.py");
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.classes[0].name, "Greeter");
        assert_eq!(facts.classes[0].methods.len(), 1);
        assert_eq!(facts.classes[0].methods[0].name, "hello");
    }

    #[test]
    fn test_parse_import_from() {
        let plugin = PythonPlugin::new();
        let source = "from os import path\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::FromImport);
        assert_eq!(imports[0].module, "os");
    }

    #[test]
    fn test_call_edge_captured() {
        let plugin = PythonPlugin::new();
        let source = "def a():\n    b()\n";
        let facts = plugin.extract_facts(source, "a.py");
        assert!(facts.intra_calls.iter().any(|c| c.callee_name == "b"));
    }
}
