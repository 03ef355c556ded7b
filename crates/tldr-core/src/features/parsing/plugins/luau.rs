//! Luau extractor (C2). No `tree-sitter-luau` grammar exists upstream, so
//! Luau gets a dedicated structural extractor instead of a `SyntaxProfile`:
//! it tracks block nesting (`function`/`if`/`for`/`while`/`do`/`repeat` ...
//! `end`/`until`) line by line to find function bodies, since Luau's type
//! annotations and generics (`function f<T>(x: T): T`) would otherwise
//! confuse a regex aimed at vanilla Lua.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::features::data_flow::infrastructure::generic_dfg_builder::compute_edges;
use crate::shared::models::{
    CallEdge, CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind, CFGInfo, DFGInfo, FileFacts,
    FunctionFact, ImportFact, ImportKind, RefType, VarRef,
};
use crate::shared::ports::language::Language;

use super::super::ports::{LanguagePlugin, SyntaxProfile};

static FUNCTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        (?:local\s+)?
        function\s+
        (?P<name>[A-Za-z_][A-Za-z0-9_]*(?:[.:][A-Za-z_][A-Za-z0-9_]*)*)
        \s*
        (?:<[^>]*>)?      # generics: <T>
        \s*\(
        (?P<params>[^)]*)
        \)
        ",
    )
    .unwrap()
});

static LOCAL_FUNCTION_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*local\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*=\s*function\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)").unwrap()
});

static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(function|if|for|while|do|repeat)\b").unwrap()
});

static BLOCK_CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(end|until)\b").unwrap());

static CALL_SITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_]*(?:[.:][A-Za-z_][A-Za-z0-9_]*)*)\s*\(").unwrap()
});

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"require\s*\(\s*(["'])(?P<path>[^"']+)\1\s*\)"#).unwrap());

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "elseif", "end", "for", "while", "do", "repeat", "until", "function",
    "local", "return", "break", "continue", "and", "or", "not", "nil", "true", "false", "in",
];

fn parse_params(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.split(':').next().unwrap_or(p).trim().to_string())
        .collect()
}

/// Scans the whole source once, matching `function ... end` blocks by
/// tracking opener/closer depth rather than recursing into a parse tree.
pub struct LuauPlugin;

impl LuauPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LuauPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for LuauPlugin {
    fn language(&self) -> Language {
        Language::Luau
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let content_hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        let mut facts = FileFacts::empty(file_path.to_string(), content_hash, Language::Luau);
        let lines: Vec<&str> = source.lines().collect();

        // Stack of (start_line, name, params). `depth_at_open` records the
        // opener-closer depth *before* this block was entered, so we know
        // when the matching `end` brings us back to that depth.
        struct OpenFunc {
            start_line: u32,
            name: String,
            params: Vec<String>,
            depth_at_open: i32,
        }
        let mut stack: Vec<OpenFunc> = Vec::new();
        let mut depth: i32 = 0;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx as u32 + 1;

            if let Some(caps) = FUNCTION_HEADER.captures(line).or_else(|| LOCAL_FUNCTION_VALUE.captures(line)) {
                let name = caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_default();
                let params = caps.name("params").map(|m| parse_params(m.as_str())).unwrap_or_default();
                stack.push(OpenFunc {
                    start_line: line_no,
                    name,
                    params,
                    depth_at_open: depth,
                });
            }

            let opens = BLOCK_OPENER.find_iter(line).count() as i32;
            let closes = BLOCK_CLOSER.find_iter(line).count() as i32;
            depth += opens - closes;

            while let Some(top) = stack.last() {
                if depth <= top.depth_at_open && (opens > 0 || closes > 0) {
                    let top = stack.pop().unwrap();
                    facts.functions.push(FunctionFact::new(
                        top.name,
                        top.params,
                        top.start_line,
                        line_no,
                        Language::Luau,
                        file_path,
                    ));
                } else {
                    break;
                }
            }
        }
        // Any still-open functions (malformed input) close at EOF.
        let eof = lines.len() as u32;
        for top in stack.into_iter().rev() {
            facts.functions.push(FunctionFact::new(
                top.name,
                top.params,
                top.start_line,
                eof,
                Language::Luau,
                file_path,
            ));
        }
        facts.functions.sort_by_key(|f| f.start_line);

        for func in &facts.functions.clone() {
            for (idx, line) in lines.iter().enumerate() {
                let line_no = idx as u32 + 1;
                if line_no < func.start_line || line_no > func.end_line {
                    continue;
                }
                for caps in CALL_SITE.captures_iter(line) {
                    let callee = caps.get(1).unwrap().as_str();
                    if KEYWORDS.contains(&callee) || callee == func.name {
                        continue;
                    }
                    let col = caps.get(1).unwrap().start() as u32;
                    facts.intra_calls.push(CallEdge::new(Some(func.name.clone()), callee, line_no, col));
                }
            }
        }

        facts.imports = self.parse_imports(source);
        facts
    }

    fn parse_imports(&self, source: &str) -> Vec<ImportFact> {
        let mut imports = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if let Some(caps) = REQUIRE_CALL.captures(line) {
                let module = caps.name("path").unwrap().as_str().to_string();
                imports.push(ImportFact::new(ImportKind::Require, module, idx as u32 + 1));
            }
        }
        imports
    }

    fn syntax_profile(&self) -> Option<&SyntaxProfile> {
        None
    }
}

static DECISION_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(if|elseif|while|for|repeat)\b").unwrap());
static SIMPLE_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:local\s+)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?P<rhs>.+)$").unwrap());
static COMPOUND_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*(?P<op>\+=|-=|\*=|/=|%=|\^=|\.\.=)\s*(?P<rhs>.+)$").unwrap()
});
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

fn new_cfg_block(blocks: &mut Vec<CFGBlock>, next_id: &mut u32, kind: CFGBlockKind) -> String {
    let id = format!("b{next_id}");
    *next_id += 1;
    blocks.push(CFGBlock::new(id.clone(), kind));
    id
}

/// Builds a CFG for a Luau function body by scanning for decision keywords
/// line by line (no parse tree to recurse over): each `if`/`elseif`/`while`/
/// `for`/`repeat` becomes one condition block with a true/false branch that
/// rejoins, mirroring the decision-point-per-keyword rule the generic
/// tree-sitter-driven builder applies structurally.
pub fn build_cfg_luau(function_name: &str, body: &str, start_line: u32) -> CFGInfo {
    let mut blocks = Vec::new();
    let mut edges = Vec::new();
    let mut next_id = 0u32;
    let entry = new_cfg_block(&mut blocks, &mut next_id, CFGBlockKind::Entry);
    let mut current = entry.clone();

    for (idx, line) in body.lines().enumerate() {
        let line_no = start_line + idx as u32;
        if !DECISION_KEYWORD.is_match(line) {
            continue;
        }
        let cond = new_cfg_block(&mut blocks, &mut next_id, CFGBlockKind::Condition);
        if let Some(block) = blocks.iter_mut().find(|b| b.id == cond) {
            block.statement_ids.push(format!("{line_no}:decision"));
        }
        edges.push(CFGEdge::new(&current, &cond, CFGEdgeKind::FallThrough));
        let branch = new_cfg_block(&mut blocks, &mut next_id, CFGBlockKind::Basic);
        edges.push(CFGEdge::new(&cond, &branch, CFGEdgeKind::TrueBranch));
        let join = new_cfg_block(&mut blocks, &mut next_id, CFGBlockKind::Basic);
        edges.push(CFGEdge::new(&cond, &join, CFGEdgeKind::FalseBranch));
        edges.push(CFGEdge::new(&branch, &join, CFGEdgeKind::FallThrough));
        current = join;
    }

    let exit = new_cfg_block(&mut blocks, &mut next_id, CFGBlockKind::Exit);
    edges.push(CFGEdge::new(&current, &exit, CFGEdgeKind::FallThrough));

    let complexity = CFGInfo::compute_complexity(edges.len(), blocks.len());
    CFGInfo {
        function_name: function_name.to_string(),
        blocks,
        edges,
        entry_block_id: entry,
        exit_block_ids: vec![exit],
        cyclomatic_complexity: complexity,
    }
}

/// Builds a DFG for a Luau function body by line-matching simple and
/// compound assignments; everything else falls back to "every identifier on
/// the line is a use". Compound assignment (`x += e`) emits a use of the old
/// value of `x` followed by a definition, per the language's semantics.
pub fn build_dfg_luau(function_name: &str, body: &str, start_line: u32) -> DFGInfo {
    let mut refs = Vec::new();

    for (idx, line) in body.lines().enumerate() {
        let line_no = start_line + idx as u32;

        if let Some(caps) = COMPOUND_ASSIGN.captures(line) {
            let name_m = caps.name("name").unwrap();
            let name = name_m.as_str();
            let col = name_m.start() as u32;
            for m in IDENT.find_iter(caps.name("rhs").unwrap().as_str()) {
                if KEYWORDS.contains(&m.as_str()) {
                    continue;
                }
                refs.push(VarRef::new(m.as_str(), RefType::Use, line_no, col));
            }
            refs.push(VarRef::new(name, RefType::Use, line_no, col));
            refs.push(VarRef::new(name, RefType::Definition, line_no, col));
            continue;
        }

        if let Some(caps) = SIMPLE_ASSIGN.captures(line) {
            let name_m = caps.name("name").unwrap();
            let name = name_m.as_str();
            let col = name_m.start() as u32;
            for m in IDENT.find_iter(caps.name("rhs").unwrap().as_str()) {
                if KEYWORDS.contains(&m.as_str()) || m.as_str() == name {
                    continue;
                }
                refs.push(VarRef::new(m.as_str(), RefType::Use, line_no, col));
            }
            refs.push(VarRef::new(name, RefType::Definition, line_no, col));
            continue;
        }

        for m in IDENT.find_iter(line) {
            if KEYWORDS.contains(&m.as_str()) {
                continue;
            }
            refs.push(VarRef::new(m.as_str(), RefType::Use, line_no, m.start() as u32));
        }
    }

    let dataflow_edges = compute_edges(&refs);
    DFGInfo {
        function_name: function_name.to_string(),
        var_refs: refs,
        dataflow_edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_function() {
        let plugin = LuauPlugin::new();
        let source = "local function add(a: number, b: number): number\n    return a + b\nend\n";
        let facts = plugin.extract_facts(source, "math.luau");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "add");
        assert_eq!(facts.functions[0].params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_generics_do_not_break_header_parsing() {
        let plugin = LuauPlugin::new();
        let source = "function identity<T>(x: T): T\n    return x\nend\n";
        let facts = plugin.extract_facts(source, "generic.luau");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].name, "identity");
        assert_eq!(facts.functions[0].params, vec!["x".to_string()]);
    }

    #[test]
    fn test_require_import() {
        let plugin = LuauPlugin::new();
        let source = "local Roact = require(\"Roact\")\n";
        let imports = plugin.parse_imports(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "Roact");
    }

    #[test]
    fn test_nested_if_inside_function_tracked_by_depth() {
        let plugin = LuauPlugin::new();
        let source = "function f(x)\n    if x then\n        return 1\n    end\n    return 0\nend\n";
        let facts = plugin.extract_facts(source, "f.luau");
        assert_eq!(facts.functions.len(), 1);
        assert_eq!(facts.functions[0].end_line, 6);
    }

    #[test]
    fn test_cfg_counts_a_decision_per_if() {
        let body = "    if x then\n        return 1\n    end\n    return 0\n";
        let cfg = build_cfg_luau("f", body, 2);
        assert_eq!(cfg.cyclomatic_complexity, 2);
    }

    #[test]
    fn test_dfg_compound_assignment_chain() {
        let body = "    x += 3\n    x -= 1\n    x *= 2\n";
        let dfg = build_dfg_luau("f", body, 2);
        assert!(dfg.var_refs.iter().filter(|r| r.is_definition()).count() >= 3);
        assert!(dfg.var_refs.iter().filter(|r| !r.is_definition()).count() >= 3);
        assert!(dfg.dataflow_edges.len() >= 2);
    }
}
