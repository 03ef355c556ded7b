//! Resolves each file's intra-file `CallEdge`s against the project symbol
//! table into cross-file `ResolvedEdge`s.
//!
//! Tie-break order, in the spec's own words: a same-file definition always
//! wins over any other candidate; failing that, pick deterministically by
//! shortest defining path, then lexicographically. A call with no candidate
//! definition, or one where the tie-break still can't separate two equally
//! short, equally-named candidates (impossible once `SymbolTable` dedups, but
//! kept as a defensive equality check), is dropped rather than guessed at.

use super::symbol_table::{Definition, SymbolTable};
use crate::shared::models::{CallEdge, FileFacts, ResolvedEdge};

fn pick<'a>(file_path: &str, candidates: &'a [Definition]) -> Option<&'a Definition> {
    if candidates.is_empty() {
        return None;
    }
    let same_file: Vec<&Definition> = candidates.iter().filter(|d| d.file == file_path).collect();
    let pool: Vec<&Definition> = if !same_file.is_empty() { same_file } else { candidates.iter().collect() };
    pool.into_iter().min_by(|a, b| (a.file.len(), &a.file, &a.function).cmp(&(b.file.len(), &b.file, &b.function)))
}

/// Resolves one file's calls. `caller_function` defaults to `"<module>"` for
/// calls made at module scope, outside any function body.
pub fn resolve_calls(file: &FileFacts, table: &SymbolTable) -> Vec<ResolvedEdge> {
    let mut out = Vec::new();
    for call in &file.intra_calls {
        let (_, member) = call.split_qualifier();
        let candidates = table.lookup(member);
        let Some(def) = pick(&file.path, candidates) else { continue };
        let caller = call.caller_function.clone().unwrap_or_else(|| "<module>".to_string());
        out.push(ResolvedEdge::new(file.path.clone(), caller, def.file.clone(), def.function.clone()));
    }
    out
}

/// Resolves every file's calls against a table built from the whole project.
pub fn resolve_project(files: &[FileFacts]) -> Vec<ResolvedEdge> {
    let table = SymbolTable::build(files);
    let mut out = Vec::new();
    for file in files {
        out.extend(resolve_calls(file, &table));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::FunctionFact;
    use crate::shared::ports::language::Language;

    fn file_with(path: &str, funcs: &[&str], calls: &[(&str, &str)]) -> FileFacts {
        let mut f = FileFacts::empty(path, "h", Language::Python);
        for name in funcs {
            f.functions.push(FunctionFact::new(*name, vec![], 1, 2, Language::Python, path));
        }
        for (caller, callee) in calls {
            f.intra_calls.push(CallEdge::new(Some((*caller).to_string()), *callee, 1, 0));
        }
        f
    }

    #[test]
    fn test_same_file_definition_wins_over_cross_file() {
        let a = file_with("a.py", &["run", "helper"], &[("run", "helper")]);
        let b = file_with("b.py", &["helper"], &[]);
        let resolved = resolve_project(&[a, b]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].dst_file, "a.py");
    }

    #[test]
    fn test_ambiguous_cross_file_call_picks_shortest_then_lexicographic_path() {
        let a = file_with("a.py", &["run"], &[("run", "shared")]);
        let b = file_with("zzzz/shared.py", &["shared"], &[]);
        let c = file_with("b.py", &["shared"], &[]);
        let resolved = resolve_project(&[a, b, c]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].dst_file, "b.py");
    }

    #[test]
    fn test_unresolvable_call_is_dropped_silently() {
        let a = file_with("a.py", &["run"], &[("run", "nonexistent")]);
        let resolved = resolve_project(&[a]);
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_module_scope_call_defaults_caller_to_module_marker() {
        let mut a = file_with("a.py", &["helper"], &[]);
        a.intra_calls.push(CallEdge::new(None, "helper", 1, 0));
        let resolved = resolve_project(&[a]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].src_func, "<module>");
    }
}
