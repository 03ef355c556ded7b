//! Control-flow graph construction (C3).
//!
//! One generic, recursive-descent builder (`infrastructure::generic_cfg_builder`)
//! walks any grammar-backed language's function body, driven entirely by the
//! `SyntaxProfile` the parsing feature already produced for that language —
//! no per-language CFG logic.

pub mod infrastructure;
pub mod ports;

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::CFGInfo;

pub use infrastructure::generic_cfg_builder::build_cfg;
pub use ports::{CFGBuilder, GenericCFGBuilder};

/// Builds one `CFGInfo` per function-like node found anywhere in `root`,
/// named by the first `identifier_kinds` child tree-sitter finds under it.
pub fn build_cfgs_for_tree(root: Node, source: &str, profile: &SyntaxProfile) -> Vec<CFGInfo> {
    let mut out = Vec::new();
    collect_and_build(root, source, profile, &mut out);
    out
}

fn collect_and_build(node: Node, source: &str, profile: &SyntaxProfile, out: &mut Vec<CFGInfo>) {
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if profile.function_kinds.contains(&child.kind()) {
            let name = function_name(&child, profile, source);
            out.push(build_cfg(&name, child, profile));
        }
        collect_and_build(child, source, profile, out);
    }
}

fn function_name(node: &Node, profile: &SyntaxProfile, source: &str) -> String {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if profile.identifier_kinds.contains(&child.kind()) {
                return source[child.start_byte()..child.end_byte()].to_string();
            }
        }
    }
    "<anonymous>".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::plugins::python::PROFILE as PYTHON_PROFILE;
    use tree_sitter::Parser;

    #[test]
    fn test_build_cfgs_for_tree_finds_every_function() {
        let source = "def a():\n    return 1\n\ndef b(x):\n    if x:\n        return 1\n    return 0\n";
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let cfgs = build_cfgs_for_tree(tree.root_node(), source, &PYTHON_PROFILE);
        assert_eq!(cfgs.len(), 2);
        let b = cfgs.iter().find(|c| c.function_name == "b").unwrap();
        assert_eq!(b.cyclomatic_complexity, 2);
    }
}
