//! Port definitions for the data-flow graph feature (C3).

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::DFGInfo;

/// Builds a `DFGInfo` for one function body. The generic implementation
/// lives in `infrastructure::generic_dfg_builder`; Luau has its own
/// regex-based builder since it has no `SyntaxProfile`.
pub trait DFGBuilder {
    fn build(&self, function_name: &str, func_node: Node, source: &str, profile: &SyntaxProfile) -> DFGInfo;
}

pub struct GenericDFGBuilder;

impl DFGBuilder for GenericDFGBuilder {
    fn build(&self, function_name: &str, func_node: Node, source: &str, profile: &SyntaxProfile) -> DFGInfo {
        super::infrastructure::generic_dfg_builder::build_dfg(function_name, func_node, source, profile)
    }
}
