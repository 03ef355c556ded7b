//! Control-flow graph types.
//!
//! These are shared across the flow-graph builder, the PDG builder, and the
//! `cfg`/`dfg`/`slice` query handlers, so they live here to avoid a
//! dependency cycle between those features.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CFGBlockKind {
    Entry,
    Exit,
    Basic,
    Condition,
    LoopHeader,
    ContinueTarget,
    BreakTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CFGBlock {
    pub id: String,
    pub kind: CFGBlockKind,
    pub statement_ids: Vec<String>,
}

impl CFGBlock {
    pub fn new(id: impl Into<String>, kind: CFGBlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            statement_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CFGEdgeKind {
    FallThrough,
    TrueBranch,
    FalseBranch,
    BackEdge,
    BreakEdge,
    ContinueEdge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CFGEdge {
    pub src_id: String,
    pub dst_id: String,
    pub kind: CFGEdgeKind,
}

impl CFGEdge {
    pub fn new(src_id: impl Into<String>, dst_id: impl Into<String>, kind: CFGEdgeKind) -> Self {
        Self {
            src_id: src_id.into(),
            dst_id: dst_id.into(),
            kind,
        }
    }
}

/// A function's complete control-flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CFGInfo {
    pub function_name: String,
    pub blocks: Vec<CFGBlock>,
    pub edges: Vec<CFGEdge>,
    pub entry_block_id: String,
    pub exit_block_ids: Vec<String>,
    pub cyclomatic_complexity: i64,
}

impl CFGInfo {
    /// Complexity = E - N + 2, for the single connected component a
    /// function's CFG always forms.
    pub fn compute_complexity(edges: usize, blocks: usize) -> i64 {
        edges as i64 - blocks as i64 + 2
    }

    /// A single-block CFG for languages/extractors that cannot build a
    /// real graph; complexity is 1 per spec.
    pub fn trivial(function_name: impl Into<String>) -> Self {
        let entry = CFGBlock::new("b0", CFGBlockKind::Entry);
        let id = entry.id.clone();
        Self {
            function_name: function_name.into(),
            blocks: vec![entry],
            edges: Vec::new(),
            entry_block_id: id.clone(),
            exit_block_ids: vec![id],
            cyclomatic_complexity: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_linear() {
        // entry -> exit: 1 edge, 2 blocks => 1 - 2 + 2 = 1
        assert_eq!(CFGInfo::compute_complexity(1, 2), 1);
    }

    #[test]
    fn test_trivial_cfg_complexity_one() {
        let cfg = CFGInfo::trivial("f");
        assert_eq!(cfg.cyclomatic_complexity, 1);
        assert_eq!(cfg.blocks.len(), 1);
    }
}
