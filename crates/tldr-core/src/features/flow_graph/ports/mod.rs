//! Port definitions for the control-flow graph feature (C3).

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::CFGInfo;

/// Builds a `CFGInfo` for one function body. The generic, `SyntaxProfile`-driven
/// implementation lives in `infrastructure::generic_cfg_builder`; languages on
/// the regex-fallback path have no implementor and get `CFGInfo::trivial`
/// from the call site instead.
pub trait CFGBuilder {
    fn build(&self, function_name: &str, func_node: Node, profile: &SyntaxProfile) -> CFGInfo;
}

/// The single generic builder every grammar-backed language shares.
pub struct GenericCFGBuilder;

impl CFGBuilder for GenericCFGBuilder {
    fn build(&self, function_name: &str, func_node: Node, profile: &SyntaxProfile) -> CFGInfo {
        super::infrastructure::generic_cfg_builder::build_cfg(function_name, func_node, profile)
    }
}
