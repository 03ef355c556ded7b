//! Grammar-driven fact extraction shared by every `SyntaxProfile`-backed
//! plugin (C2). One walk of the tree produces functions, classes, and
//! intra-file call edges; only the node-kind tables in `SyntaxProfile` vary
//! per language, not this algorithm.
//!
//! Walks with an explicit stack rather than recursion, per the redesign away
//! from deep-recursion AST walking.

use tree_sitter::Node;

use crate::shared::models::{CallEdge, ClassFact, FileFacts, FunctionFact};
use crate::shared::ports::language::Language;
use crate::shared::utils::tree_sitter::{extract_node_text_owned, node_to_span};

use super::super::ports::SyntaxProfile;

fn first_matching_child<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                return Some(child);
            }
        }
    }
    None
}

fn collect_matching_descendants<'a>(node: &Node<'a>, kinds: &[&str], stop_at: &[&str]) -> Vec<Node<'a>> {
    let mut result = Vec::new();
    let mut stack: Vec<Node<'a>> = Vec::new();
    for i in (0..node.child_count()).rev() {
        if let Some(child) = node.child(i) {
            stack.push(child);
        }
    }
    while let Some(current) = stack.pop() {
        if kinds.contains(&current.kind()) {
            result.push(current);
            continue;
        }
        if stop_at.contains(&current.kind()) {
            continue;
        }
        for i in (0..current.child_count()).rev() {
            if let Some(child) = current.child(i) {
                stack.push(child);
            }
        }
    }
    result
}

fn function_name(node: &Node, profile: &SyntaxProfile, source: &str) -> String {
    first_matching_child(node, profile.identifier_kinds)
        .map(|n| extract_node_text_owned(&n, source))
        .unwrap_or_else(|| "<anonymous>".to_string())
}

fn function_params(node: &Node, profile: &SyntaxProfile, source: &str) -> Vec<String> {
    let params_node = match first_matching_child(node, profile.parameter_kinds) {
        Some(n) => n,
        None => return Vec::new(),
    };
    let mut params = Vec::new();
    for i in 0..params_node.child_count() {
        let child = match params_node.child(i) {
            Some(c) if c.is_named() => c,
            _ => continue,
        };
        if profile.identifier_kinds.contains(&child.kind()) {
            params.push(extract_node_text_owned(&child, source));
        } else if let Some(id) = first_matching_child(&child, profile.identifier_kinds) {
            params.push(extract_node_text_owned(&id, source));
        }
    }
    params
}

fn is_async(node: &Node, source: &str) -> bool {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() != node.kind() && child.is_named() {
                break;
            }
            if !child.is_named() && extract_node_text_owned(&child, source) == "async" {
                return true;
            }
        }
    }
    false
}

fn call_callee_text(call_node: &Node, source: &str) -> Option<String> {
    call_node.child(0).map(|callee| extract_node_text_owned(&callee, source))
}

/// Walks `root` and produces the functions, classes (with their methods
/// nested inside), and intra-file call edges found in `source`.
pub fn extract_file_facts(
    root: Node,
    source: &str,
    file_path: &str,
    language: Language,
    profile: &SyntaxProfile,
) -> FileFacts {
    let content_hash = blake3::hash(source.as_bytes()).to_hex().to_string();
    let mut facts = FileFacts::empty(file_path.to_string(), content_hash, language);

    let top_level_functions = collect_matching_descendants(&root, profile.function_kinds, profile.class_kinds);
    for func_node in &top_level_functions {
        facts
            .functions
            .push(build_function_fact(func_node, profile, source, language, file_path));
    }

    let class_nodes = collect_matching_descendants(&root, profile.class_kinds, &[]);
    for class_node in &class_nodes {
        let name = first_matching_child(class_node, profile.identifier_kinds)
            .map(|n| extract_node_text_owned(&n, source))
            .unwrap_or_else(|| "<anonymous>".to_string());
        let span = node_to_span(class_node);

        let method_nodes = collect_matching_descendants(class_node, profile.function_kinds, profile.class_kinds);
        let mut class_fact = ClassFact::new(name, span.start_line, span.end_line);
        class_fact.methods = method_nodes
            .iter()
            .map(|m| build_function_fact(m, profile, source, language, file_path))
            .collect();

        facts.classes.push(class_fact);
    }

    let all_function_nodes: Vec<Node> = collect_matching_descendants(&root, profile.function_kinds, &[]);
    for func_node in &all_function_nodes {
        let caller = function_name(func_node, profile, source);
        let call_nodes = collect_matching_descendants(func_node, profile.call_kinds, profile.function_kinds);
        for call_node in call_nodes {
            if let Some(callee_text) = call_callee_text(&call_node, source) {
                let pos = call_node.start_position();
                facts.intra_calls.push(CallEdge::new(
                    Some(caller.clone()),
                    callee_text,
                    pos.row as u32 + 1,
                    pos.column as u32,
                ));
            }
        }
    }

    facts
}

fn build_function_fact(
    func_node: &Node,
    profile: &SyntaxProfile,
    source: &str,
    language: Language,
    file_path: &str,
) -> FunctionFact {
    let name = function_name(func_node, profile, source);
    let params = function_params(func_node, profile, source);
    let span = node_to_span(func_node);
    let mut fact = FunctionFact::new(name, params, span.start_line, span.end_line, language, file_path);
    if is_async(func_node, source) {
        fact = fact.with_async(true);
    }
    fact
}
