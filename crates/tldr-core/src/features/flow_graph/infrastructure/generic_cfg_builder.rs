//! Generic control-flow graph builder (C3). One algorithm, driven entirely
//! by a `SyntaxProfile`'s node-kind tables, builds the CFG for any
//! grammar-backed language's function body — no per-language duplication of
//! the block/edge logic itself, grounded on the block-kind-driven edge
//! assignment the single-language builder in this feature used to do by
//! hand (sequential blocks get a fall-through edge, branches get
//! true/false edges, loops get a back-edge plus an exit edge).
//!
//! Walks with bounded recursion over control-structure nesting (not file
//! size) rather than an explicit work-stack, since branch/loop joins need a
//! call stack shaped like the nesting itself.

use tree_sitter::Node;

use crate::features::parsing::ports::SyntaxProfile;
use crate::shared::models::{CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind, CFGInfo};

struct LoopCtx {
    header_id: String,
    breakers: Vec<String>,
}

struct Builder<'p> {
    profile: &'p SyntaxProfile,
    blocks: Vec<CFGBlock>,
    edges: Vec<CFGEdge>,
    next_id: u32,
    loop_stack: Vec<LoopCtx>,
}

impl<'p> Builder<'p> {
    fn new_block(&mut self, kind: CFGBlockKind) -> String {
        let id = format!("b{}", self.next_id);
        self.next_id += 1;
        self.blocks.push(CFGBlock::new(id.clone(), kind));
        id
    }

    fn add_edge(&mut self, src: &str, dst: &str, kind: CFGEdgeKind) {
        self.edges.push(CFGEdge::new(src, dst, kind));
    }

    fn record_stmt(&mut self, block_id: &str, stmt: &Node) {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) {
            block
                .statement_ids
                .push(format!("{}:{}", stmt.start_position().row + 1, stmt.kind()));
        }
    }

    fn find_profile_child<'a>(&self, node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if kinds.contains(&child.kind()) {
                    return Some(child);
                }
            }
        }
        None
    }

    fn body_of<'a>(&self, node: &Node<'a>) -> Option<Node<'a>> {
        self.find_profile_child(node, self.profile.block_kinds)
    }

    /// Collects every `kinds`-matching node reachable from `node` without
    /// crossing into a nested switch/match or try of the same profile — so a
    /// `case`/`except` belonging to an inner switch/try isn't mistaken for
    /// one of `node`'s own.
    fn immediate_children_of_kind<'a>(&self, node: &Node<'a>, kinds: &[&str]) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            if kinds.contains(&child.kind()) {
                out.push(child);
                continue;
            }
            if self.profile.switch_kinds.contains(&child.kind()) || self.profile.try_kinds.contains(&child.kind()) {
                continue;
            }
            out.extend(self.immediate_children_of_kind(&child, kinds));
        }
        out
    }

    /// Walks every named child of `block_node` in order, threading the
    /// "currently open" block id through. Returns `None` once a statement
    /// makes the rest of the block unreachable (return/break/continue).
    fn walk_block(&mut self, block_node: Node, mut current: Option<String>, exit_id: &str) -> Option<String> {
        let count = block_node.named_child_count();
        for i in 0..count {
            let Some(stmt) = block_node.named_child(i) else {
                continue;
            };
            let Some(cur) = current else {
                // Unreachable statement: give it its own disconnected block
                // so it still gets a CFGBlock/edges, matching how a dead
                // branch is still valid (if unreachable) structure.
                current = Some(self.walk_stmt(&stmt, self.new_block(CFGBlockKind::Basic), exit_id));
                continue;
            };
            current = self.walk_stmt(&stmt, cur, exit_id);
        }
        current
    }

    fn walk_stmt(&mut self, stmt: &Node, current: String, exit_id: &str) -> Option<String> {
        let kind = stmt.kind();
        let profile = self.profile;

        if profile.if_kinds.contains(&kind) || profile.elif_kinds.contains(&kind) {
            return self.walk_if(stmt, current, exit_id);
        }
        if profile.while_kinds.contains(&kind) || profile.for_kinds.contains(&kind) || profile.repeat_kinds.contains(&kind) {
            return self.walk_loop(stmt, current, exit_id);
        }
        if profile.switch_kinds.contains(&kind) {
            return self.walk_switch(stmt, current, exit_id);
        }
        if profile.try_kinds.contains(&kind) {
            return self.walk_try(stmt, current, exit_id);
        }
        if profile.return_kinds.contains(&kind) {
            self.record_stmt(&current, stmt);
            self.add_edge(&current, exit_id, CFGEdgeKind::FallThrough);
            return None;
        }
        if profile.raise_kinds.contains(&kind) {
            self.record_stmt(&current, stmt);
            self.add_edge(&current, exit_id, CFGEdgeKind::FallThrough);
            return None;
        }
        if profile.break_kinds.contains(&kind) {
            self.record_stmt(&current, stmt);
            if let Some(ctx) = self.loop_stack.last_mut() {
                ctx.breakers.push(current.clone());
            }
            return None;
        }
        if profile.continue_kinds.contains(&kind) {
            self.record_stmt(&current, stmt);
            if let Some(ctx) = self.loop_stack.last() {
                let header = ctx.header_id.clone();
                self.add_edge(&current, &header, CFGEdgeKind::ContinueEdge);
            }
            return None;
        }

        self.record_stmt(&current, stmt);
        Some(current)
    }

    fn walk_if(&mut self, stmt: &Node, current: String, exit_id: &str) -> Option<String> {
        let cond = self.new_block(CFGBlockKind::Condition);
        self.add_edge(&current, &cond, CFGEdgeKind::FallThrough);
        self.record_stmt(&cond, stmt);

        let then_start = self.new_block(CFGBlockKind::Basic);
        self.add_edge(&cond, &then_start, CFGEdgeKind::TrueBranch);
        let then_end = match self.body_of(stmt) {
            Some(body) => self.walk_block(body, Some(then_start), exit_id),
            None => Some(then_start),
        };

        // `else` / `elif` lives on whichever of else_kinds/elif_kinds the
        // grammar attaches as a direct child of the if-statement node.
        let else_child = self
            .find_profile_child(stmt, self.profile.else_kinds)
            .or_else(|| self.find_profile_child(stmt, self.profile.elif_kinds));

        let join = self.new_block(CFGBlockKind::Basic);
        match else_child {
            Some(else_node) => {
                let else_start = self.new_block(CFGBlockKind::Basic);
                self.add_edge(&cond, &else_start, CFGEdgeKind::FalseBranch);
                let else_end = if self.profile.elif_kinds.contains(&else_node.kind())
                    || self.profile.if_kinds.contains(&else_node.kind())
                {
                    self.walk_stmt(&else_node, else_start, exit_id)
                } else {
                    match self.body_of(&else_node) {
                        Some(body) => self.walk_block(body, Some(else_start), exit_id),
                        None => Some(else_start),
                    }
                };
                if let Some(te) = then_end {
                    self.add_edge(&te, &join, CFGEdgeKind::FallThrough);
                }
                if let Some(ee) = else_end {
                    self.add_edge(&ee, &join, CFGEdgeKind::FallThrough);
                }
            }
            None => {
                self.add_edge(&cond, &join, CFGEdgeKind::FalseBranch);
                if let Some(te) = then_end {
                    self.add_edge(&te, &join, CFGEdgeKind::FallThrough);
                }
            }
        }
        Some(join)
    }

    fn walk_loop(&mut self, stmt: &Node, current: String, exit_id: &str) -> Option<String> {
        let header = self.new_block(CFGBlockKind::LoopHeader);
        self.add_edge(&current, &header, CFGEdgeKind::FallThrough);
        self.record_stmt(&header, stmt);

        let body_start = self.new_block(CFGBlockKind::Basic);
        self.add_edge(&header, &body_start, CFGEdgeKind::TrueBranch);

        self.loop_stack.push(LoopCtx {
            header_id: header.clone(),
            breakers: Vec::new(),
        });
        let body_end = match self.body_of(stmt) {
            Some(body) => self.walk_block(body, Some(body_start), exit_id),
            None => Some(body_start),
        };
        if let Some(be) = body_end {
            self.add_edge(&be, &header, CFGEdgeKind::BackEdge);
        }
        let ctx = self.loop_stack.pop().expect("just pushed");

        let after = self.new_block(CFGBlockKind::Basic);
        self.add_edge(&header, &after, CFGEdgeKind::FalseBranch);
        for breaker in &ctx.breakers {
            self.add_edge(breaker, &after, CFGEdgeKind::BreakEdge);
        }
        Some(after)
    }

    /// One decision edge per `case`/`default` clause, matching `walk_if`'s
    /// one-edge-per-branch shape. A `break` inside a case joins directly
    /// after the switch, same as it would after a loop.
    fn walk_switch(&mut self, stmt: &Node, current: String, exit_id: &str) -> Option<String> {
        let cond = self.new_block(CFGBlockKind::Condition);
        self.add_edge(&current, &cond, CFGEdgeKind::FallThrough);
        self.record_stmt(&cond, stmt);

        let cases = self.immediate_children_of_kind(stmt, self.profile.case_kinds);
        let join = self.new_block(CFGBlockKind::Basic);
        if cases.is_empty() {
            self.add_edge(&cond, &join, CFGEdgeKind::FallThrough);
            return Some(join);
        }

        self.loop_stack.push(LoopCtx { header_id: join.clone(), breakers: Vec::new() });
        for case in &cases {
            let case_start = self.new_block(CFGBlockKind::Basic);
            self.add_edge(&cond, &case_start, CFGEdgeKind::TrueBranch);
            let case_end = match self.body_of(case) {
                Some(body) => self.walk_block(body, Some(case_start), exit_id),
                None => self.walk_block(*case, Some(case_start), exit_id),
            };
            if let Some(ce) = case_end {
                self.add_edge(&ce, &join, CFGEdgeKind::FallThrough);
            }
        }
        let ctx = self.loop_stack.pop().expect("just pushed");
        for breaker in &ctx.breakers {
            self.add_edge(breaker, &join, CFGEdgeKind::BreakEdge);
        }
        Some(join)
    }

    /// One decision edge per `except`/`catch` clause: control reaches a
    /// handler instead of falling through the body. A bare `try`/`finally`
    /// with no handler contributes no decision edge.
    fn walk_try(&mut self, stmt: &Node, current: String, exit_id: &str) -> Option<String> {
        let handlers = self.immediate_children_of_kind(stmt, self.profile.except_kinds);
        if handlers.is_empty() {
            return match self.body_of(stmt) {
                Some(body) => self.walk_block(body, Some(current), exit_id),
                None => Some(current),
            };
        }

        let cond = self.new_block(CFGBlockKind::Condition);
        self.add_edge(&current, &cond, CFGEdgeKind::FallThrough);
        self.record_stmt(&cond, stmt);

        let body_start = self.new_block(CFGBlockKind::Basic);
        self.add_edge(&cond, &body_start, CFGEdgeKind::TrueBranch);
        let body_end = match self.body_of(stmt) {
            Some(body) => self.walk_block(body, Some(body_start), exit_id),
            None => Some(body_start),
        };

        let join = self.new_block(CFGBlockKind::Basic);
        if let Some(be) = body_end {
            self.add_edge(&be, &join, CFGEdgeKind::FallThrough);
        }

        for handler in &handlers {
            let handler_start = self.new_block(CFGBlockKind::Basic);
            self.add_edge(&cond, &handler_start, CFGEdgeKind::FalseBranch);
            let handler_end = match self.body_of(handler) {
                Some(body) => self.walk_block(body, Some(handler_start), exit_id),
                None => self.walk_block(*handler, Some(handler_start), exit_id),
            };
            if let Some(he) = handler_end {
                self.add_edge(&he, &join, CFGEdgeKind::FallThrough);
            }
        }
        Some(join)
    }
}

/// Builds the CFG for one function's body (the node matching
/// `profile.block_kinds` found inside the function node, or the function
/// node itself if the grammar has no separate block wrapper).
pub fn build_cfg(function_name: &str, func_node: Node, profile: &SyntaxProfile) -> CFGInfo {
    let mut builder = Builder {
        profile,
        blocks: Vec::new(),
        edges: Vec::new(),
        next_id: 0,
        loop_stack: Vec::new(),
    };

    let entry = builder.new_block(CFGBlockKind::Entry);
    let exit = builder.new_block(CFGBlockKind::Exit);

    let body = builder.body_of(&func_node).unwrap_or(func_node);
    let last_open = builder.walk_block(body, Some(entry.clone()), &exit);
    if let Some(last) = last_open {
        builder.add_edge(&last, &exit, CFGEdgeKind::FallThrough);
    }

    let complexity = CFGInfo::compute_complexity(builder.edges.len(), builder.blocks.len());
    CFGInfo {
        function_name: function_name.to_string(),
        blocks: builder.blocks,
        edges: builder.edges,
        entry_block_id: entry,
        exit_block_ids: vec![exit],
        cyclomatic_complexity: complexity,
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
    fn test_linear_function_complexity_one() {
        let code = "def f():\n    x = 1\n    return x\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 1);
    }

    #[test]
    fn test_single_if_complexity_two() {
        let code = "def f(x):\n    if x:\n        return 1\n    return 0\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 2);
    }

    #[test]
    fn test_if_else_complexity_two() {
        let code = "def f(x):\n    if x:\n        y = 1\n    else:\n        y = 2\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 2);
    }

    #[test]
    fn test_try_except_adds_a_decision_edge() {
        let code = "def f(x):\n    try:\n        y = 1\n    except ValueError:\n        y = 2\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 2);
        assert!(cfg.blocks.iter().any(|b| matches!(b.kind, CFGBlockKind::Condition)));
    }

    #[test]
    fn test_bare_try_finally_adds_no_decision_edge() {
        let code = "def f(x):\n    try:\n        y = 1\n    finally:\n        pass\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 1);
    }

    #[test]
    fn test_match_statement_adds_one_edge_per_case() {
        let code = "def f(x):\n    match x:\n        case 1:\n            y = 1\n        case 2:\n            y = 2\n    return y\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert_eq!(cfg.cyclomatic_complexity, 2);
        assert_eq!(cfg.blocks.iter().filter(|b| matches!(b.kind, CFGBlockKind::Condition)).count(), 1);
    }

    #[test]
    fn test_while_loop_has_back_edge() {
        let code = "def f(x):\n    while x:\n        x = x - 1\n    return x\n";
        let tree = parse_python(code);
        let func = tree.root_node().child(0).unwrap();
        let cfg = build_cfg("f", func, &PYTHON_PROFILE);
        assert!(cfg
            .edges
            .iter()
            .any(|e| matches!(e.kind, crate::shared::models::CFGEdgeKind::BackEdge)));
    }
}
