//! Lua extractor (C2), grounded on tree-sitter-lua. Standard Lua has no
//! generics, type annotations, `continue`, or compound assignment — those
//! belong to Luau and are handled by `plugins::luau` instead.

use tree_sitter::Parser;

use crate::shared::models::{FileFacts, ImportFact, ImportKind, PDGInfo};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, find_descendants_by_kind};

use super::super::infrastructure::generic_extractor::extract_file_facts;
use super::super::ports::{LanguagePlugin, SyntaxProfile};

const PROFILE: SyntaxProfile = SyntaxProfile {
    function_kinds: &["function_declaration", "function_definition"],
    class_kinds: &[],
    if_kinds: &["if_statement"],
    elif_kinds: &["elseif_statement"],
    else_kinds: &["else_statement"],
    while_kinds: &["while_statement"],
    for_kinds: &["for_statement", "for_in_statement"],
    repeat_kinds: &["repeat_statement"],
    switch_kinds: &[],
    case_kinds: &[],
    try_kinds: &[],
    except_kinds: &[],
    return_kinds: &["return_statement"],
    break_kinds: &["break_statement"],
    continue_kinds: &[],
    raise_kinds: &[],
    call_kinds: &["function_call"],
    assignment_kinds: &["assignment_statement"],
    augmented_assignment_kinds: &[],
    identifier_kinds: &["identifier"],
    block_kinds: &["block"],
    parameter_kinds: &["parameters"],
};

pub struct LuaPlugin;

impl LuaPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Parser {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_lua::language())
            .expect("tree-sitter-lua grammar should load");
        parser
    }
}

impl Default for LuaPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for LuaPlugin {
    fn language(&self) -> Language {
        Language::Lua
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let mut parser = Self::parser();
        let Some(tree) = parser.parse(source, None) else {
            return FileFacts::empty(file_path.to_string(), String::new(), Language::Lua);
        };
        let mut facts = extract_file_facts(tree.root_node(), source, file_path, Language::Lua, &PROFILE);
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
        for call in find_descendants_by_kind(&root, "function_call") {
            let Some(name_node) = call.child(0) else {
                continue;
            };
            if extract_node_text_owned(&name_node, source) != "require" {
                continue;
            }
            let line = call.start_position().row as u32 + 1;
            if let Some(args) = crate::shared::utils::tree_sitter::find_child_by_kind(&call, "arguments") {
                if let Some(s) = crate::shared::utils::tree_sitter::find_child_by_kind(&args, "string") {
                    let raw = extract_node_text_owned(&s, source);
                    let module = raw.trim_matches(|c| c == '\'' || c == '"').to_string();
                    imports.push(ImportFact::new(ImportKind::Require, module, line));
                }
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
        let plugin = LuaPlugin::new();
        let source = "function add(a, b)\n    return a + b\nend\n";
        let facts = plugin.extract_facts(source, "math.lua");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
    }
}
