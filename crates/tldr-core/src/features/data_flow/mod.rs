//! Data-flow graph construction (C3): definitions, uses, and the reaching
//! definitions that connect them, for any grammar-backed language via its
//! `SyntaxProfile`.

pub mod infrastructure;
pub mod ports;

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::DFGInfo;

pub use infrastructure::generic_dfg_builder::build_dfg;
pub use ports::{DFGBuilder, GenericDFGBuilder};

/// Builds one `DFGInfo` per function-like node found anywhere in `root`,
/// named the same way `flow_graph::build_cfgs_for_tree` names its CFGs.
pub fn build_dfgs_for_tree(root: Node, source: &str, profile: &SyntaxProfile) -> Vec<DFGInfo> {
    let mut out = Vec::new();
    collect_and_build(root, source, profile, &mut out);
    out
}

fn collect_and_build(node: Node, source: &str, profile: &SyntaxProfile, out: &mut Vec<DFGInfo>) {
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if profile.function_kinds.contains(&child.kind()) {
            let name = function_name(&child, profile, source);
            out.push(build_dfg(&name, child, source, profile));
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
