//! Generic data-flow graph builder (C3), driven by the same `SyntaxProfile`
//! the parsing and CFG features use. Grounded on the position-based
//! reaching-definition rule the single-language builder in this feature used
//! to apply by hand: a use's reaching definition is the most recent
//! preceding same-name definition in source order.
//!
//! Field access (`a.b`) only reads `a`: a node exposing both an `object` and
//! a `property`/`attribute` field is treated as member access and only its
//! object subtree is walked.

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::{CFGInfo, DataflowEdge, DFGInfo, RefType, VarRef};

fn text(node: &Node, source: &str) -> String {
    source[node.start_byte()..node.end_byte()].to_string()
}

fn push_ref(node: &Node, source: &str, ref_type: RefType, refs: &mut Vec<VarRef>) {
    refs.push(VarRef::new(
        text(node, source),
        ref_type,
        node.start_position().row as u32 + 1,
        node.start_position().column as u32,
    ));
}

fn collect_identifiers(node: &Node, source: &str, profile: &SyntaxProfile, ref_type: RefType, refs: &mut Vec<VarRef>) {
    if profile.identifier_kinds.contains(&node.kind()) {
        push_ref(node, source, ref_type, refs);
        return;
    }
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            collect_identifiers(&child, source, profile, ref_type, refs);
        }
    }
}

fn find_profile_child<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                return Some(child);
            }
        }
    }
    None
}

fn rhs_of<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    node.child_by_field_name("right")
        .or_else(|| node.named_child(node.named_child_count().saturating_sub(1)))
}

fn walk(node: Node, source: &str, profile: &SyntaxProfile, refs: &mut Vec<VarRef>) {
    let kind = node.kind();

    if profile.assignment_kinds.contains(&kind) {
        if let Some(right) = rhs_of(&node) {
            walk(right, source, profile, refs);
        }
        if let Some(left) = node.child_by_field_name("left").or_else(|| node.named_child(0)) {
            collect_identifiers(&left, source, profile, RefType::Definition, refs);
        }
        return;
    }

    if profile.augmented_assignment_kinds.contains(&kind) {
        if let Some(right) = rhs_of(&node) {
            walk(right, source, profile, refs);
        }
        if let Some(left) = node.child_by_field_name("left").or_else(|| node.named_child(0)) {
            collect_identifiers(&left, source, profile, RefType::Use, refs);
            collect_identifiers(&left, source, profile, RefType::Definition, refs);
        }
        return;
    }

    if profile.parameter_kinds.contains(&kind) {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                collect_identifiers(&child, source, profile, RefType::Definition, refs);
            }
        }
        return;
    }

    if profile.for_kinds.contains(&kind) {
        if let Some(right) = node.child_by_field_name("right") {
            walk(right, source, profile, refs);
        }
        if let Some(left) = node.child_by_field_name("left") {
            collect_identifiers(&left, source, profile, RefType::Definition, refs);
        }
        let body = node
            .child_by_field_name("body")
            .or_else(|| find_profile_child(&node, profile.block_kinds));
        if let Some(body) = body {
            walk(body, source, profile, refs);
        }
        return;
    }

    // Member/attribute access (`a.b`, `a:b`): only the object is a use.
    if node.child_by_field_name("property").is_some() || node.child_by_field_name("attribute").is_some() {
        if let Some(object) = node.child_by_field_name("object") {
            walk(object, source, profile, refs);
            return;
        }
    }

    if profile.identifier_kinds.contains(&kind) {
        push_ref(&node, source, RefType::Use, refs);
        return;
    }

    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            walk(child, source, profile, refs);
        }
    }
}

/// Reused by the Luau regex-based DFG builder, which has no `SyntaxProfile`
/// to drive this module's tree walk but still wants the same reaching-def
/// rule applied to the `VarRef`s it collects by hand.
pub(crate) fn compute_edges(refs: &[VarRef]) -> Vec<DataflowEdge> {
    let mut last_def: HashMap<&str, (u32, u32)> = HashMap::new();
    let mut edges = Vec::new();
    for r in refs {
        match r.ref_type {
            RefType::Definition => {
                last_def.insert(r.name.as_str(), (r.line, r.column));
            }
            RefType::Use => {
                if let Some(&(dl, dc)) = last_def.get(r.name.as_str()) {
                    edges.push(DataflowEdge::new(r.name.clone(), (dl, dc), (r.line, r.column)));
                }
            }
        }
    }
    edges
}

type DefSet = HashSet<(u32, u32)>;
type ReachingMap = HashMap<String, DefSet>;

/// Maps each block to the (position-ordered) refs that land on one of its
/// `statement_ids` lines. Parameter refs have no statement of their own —
/// they're defined at the function header — so they're seeded onto the
/// entry block ahead of whatever body refs also land there.
fn refs_by_block<'a>(cfg: &CFGInfo, param_refs: &'a [VarRef], body_refs: &'a [VarRef]) -> HashMap<String, Vec<&'a VarRef>> {
    let mut line_to_block: HashMap<u32, &str> = HashMap::new();
    for block in &cfg.blocks {
        for stmt_id in &block.statement_ids {
            if let Some((line, _)) = stmt_id.split_once(':') {
                if let Ok(line) = line.parse::<u32>() {
                    line_to_block.insert(line, &block.id);
                }
            }
        }
    }

    let mut grouped: HashMap<String, Vec<&VarRef>> = HashMap::new();
    grouped.entry(cfg.entry_block_id.clone()).or_default().extend(param_refs);
    for r in body_refs {
        let block_id = line_to_block.get(&r.line).copied().unwrap_or(cfg.entry_block_id.as_str());
        grouped.entry(block_id.to_string()).or_default().push(r);
    }
    grouped
}

/// This block's own last-definition-per-variable (`gen`) and the set of
/// variable names it (re)defines anywhere (`kill`) — the two ingredients a
/// reaching-definitions fixpoint needs per block, independent of what flows
/// in from its predecessors.
fn gen_kill(refs: &[&VarRef]) -> (HashMap<String, (u32, u32)>, HashSet<String>) {
    let mut gen = HashMap::new();
    let mut kill = HashSet::new();
    for r in refs {
        if r.is_definition() {
            gen.insert(r.name.clone(), (r.line, r.column));
            kill.insert(r.name.clone());
        }
    }
    (gen, kill)
}

/// Standard reaching-definitions dataflow: iterate `IN[B] = ⋃ OUT[pred]`,
/// `OUT[B] = GEN[B] ∪ (IN[B] − KILL[B])` to a fixpoint over the function's
/// CFG, then replay each block's refs against its converged `IN[B]` to
/// resolve every use to every definition that can actually reach it — not
/// just whichever one a flat source-order scan happened to visit last.
pub(crate) fn compute_edges_over_cfg(cfg: &CFGInfo, param_refs: &[VarRef], body_refs: &[VarRef]) -> Vec<DataflowEdge> {
    let by_block = refs_by_block(cfg, param_refs, body_refs);

    let mut preds: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &cfg.edges {
        preds.entry(edge.dst_id.as_str()).or_default().push(edge.src_id.as_str());
    }

    let mut gen: HashMap<&str, HashMap<String, (u32, u32)>> = HashMap::new();
    let mut kill: HashMap<&str, HashSet<String>> = HashMap::new();
    for block in &cfg.blocks {
        let refs = by_block.get(&block.id).map(Vec::as_slice).unwrap_or(&[]);
        let (g, k) = gen_kill(refs);
        gen.insert(block.id.as_str(), g);
        kill.insert(block.id.as_str(), k);
    }

    let mut in_sets: HashMap<&str, ReachingMap> = cfg.blocks.iter().map(|b| (b.id.as_str(), HashMap::new())).collect();
    let mut out_sets: HashMap<&str, ReachingMap> = cfg.blocks.iter().map(|b| (b.id.as_str(), HashMap::new())).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for block in &cfg.blocks {
            let id = block.id.as_str();
            let mut new_in: ReachingMap = HashMap::new();
            for &pred in preds.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(pred_out) = out_sets.get(pred) {
                    for (name, defs) in pred_out {
                        new_in.entry(name.clone()).or_default().extend(defs.iter().copied());
                    }
                }
            }

            let block_kill = &kill[id];
            let block_gen = &gen[id];
            let mut new_out: ReachingMap = HashMap::new();
            for (name, defs) in &new_in {
                if !block_kill.contains(name) {
                    new_out.insert(name.clone(), defs.clone());
                }
            }
            for (name, pos) in block_gen {
                new_out.entry(name.clone()).or_default().insert(*pos);
            }

            if in_sets[id] != new_in {
                in_sets.insert(id, new_in);
                changed = true;
            }
            if out_sets[id] != new_out {
                out_sets.insert(id, new_out);
                changed = true;
            }
        }
    }

    let mut edges = Vec::new();
    for block in &cfg.blocks {
        let mut local = in_sets[block.id.as_str()].clone();
        for r in by_block.get(&block.id).map(Vec::as_slice).unwrap_or(&[]) {
            match r.ref_type {
                RefType::Definition => {
                    local.insert(r.name.clone(), HashSet::from([(r.line, r.column)]));
                }
                RefType::Use => {
                    if let Some(defs) = local.get(&r.name) {
                        for &(dl, dc) in defs {
                            edges.push(DataflowEdge::new(r.name.clone(), (dl, dc), (r.line, r.column)));
                        }
                    }
                }
            }
        }
    }
    edges
}

/// Builds the DFG for one function, given the `func_node` (the same node
/// `build_cfg` would receive) and its `SyntaxProfile`. Parameters are
/// treated as definitions at the function header before the body is walked,
/// and a use's reaching definitions are resolved over the function's CFG
/// rather than a flat source-order scan, so both sides of a branch that
/// defines the same variable reach a use after the branches rejoin.
pub fn build_dfg(function_name: &str, func_node: Node, source: &str, profile: &SyntaxProfile) -> DFGInfo {
    let mut param_refs = Vec::new();
    if let Some(params) = find_profile_child(&func_node, profile.parameter_kinds) {
        walk(params, source, profile, &mut param_refs);
    }

    let mut body_refs = Vec::new();
    let body = find_profile_child(&func_node, profile.block_kinds).unwrap_or(func_node);
    walk(body, source, profile, &mut body_refs);

    let cfg = crate::features::flow_graph::build_cfg(function_name, func_node, profile);
    let dataflow_edges = compute_edges_over_cfg(&cfg, &param_refs, &body_refs);

    let mut refs = param_refs;
    refs.extend(body_refs);
    DFGInfo {
        function_name: function_name.to_string(),
        var_refs: refs,
        dataflow_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::plugins::python::PROFILE as PYTHON_PROFILE;
    use tree_sitter::Parser;

    fn parse_python(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::language()).unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_simple_assignment_and_use() {
        let code = "def f():\n    x = 1\n    y = x + 1\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);
        assert!(dfg.var_refs.iter().any(|r| r.name == "x" && r.is_definition()));
        assert!(dfg.dataflow_edges.iter().any(|e| e.var_name == "x"));
    }

    #[test]
    fn test_parameter_is_a_definition() {
        let code = "def f(x):\n    return x\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);
        assert!(dfg.var_refs.iter().any(|r| r.name == "x" && r.is_definition()));
        assert!(dfg.dataflow_edges.iter().any(|e| e.var_name == "x"));
    }

    #[test]
    fn test_both_branches_of_an_if_reach_a_use_after_the_join() {
        let code = "def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);

        let y_defs: Vec<(u32, u32)> = dfg
            .var_refs
            .iter()
            .filter(|r| r.name == "y" && r.is_definition())
            .map(|r| (r.line, r.column))
            .collect();
        assert_eq!(y_defs.len(), 2, "both branches should define y");

        let reaching: Vec<_> = dfg
            .dataflow_edges
            .iter()
            .filter(|e| e.var_name == "y")
            .map(|e| e.def_site)
            .collect();
        for def_site in &y_defs {
            assert!(
                reaching.contains(def_site),
                "the return y use should be reachable from both the then and else definitions, not just the last one visited"
            );
        }
    }

    #[test]
    fn test_attribute_access_only_uses_object() {
        let code = "def f(a):\n    return a.b\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let dfg = build_dfg("f", func, code, &PYTHON_PROFILE);
        assert!(!dfg.var_refs.iter().any(|r| r.name == "b"));
        assert!(dfg.var_refs.iter().any(|r| r.name == "a" && !r.is_definition()));
    }
}
