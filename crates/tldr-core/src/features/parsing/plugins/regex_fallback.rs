//! Regex-fallback extractor (§4.1) for languages with no grammar wired up
//! in this registry: C, C++, C#, Ruby, PHP, Swift, Scala. Extraction is
//! best-effort — function signatures and `IDENT(` call sites, no CFG/DFG
//! (callers get `CFGInfo::trivial`), never fatal when a file doesn't match.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::shared::models::{CallEdge, FileFacts, FunctionFact, ImportFact, ImportKind};
use crate::shared::ports::language::Language;

use super::super::ports::{LanguagePlugin, SyntaxProfile};

struct LangSyntax {
    function_header: &'static Regex,
    import_line: &'static Regex,
    import_kind: ImportKind,
}

static CALL_SITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

static C_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_ *]*?\b(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<params>[^)]*)\)\s*\{").unwrap()
});
static C_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*#include\s*[<"](?P<path>[^>"]+)[>"]"#).unwrap());

static CSHARP_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:public|private|protected|internal|static|\s)*\b[\w<>\[\],]+\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<params>[^)]*)\)\s*\{?").unwrap()
});
static CSHARP_USING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*using\s+(?P<path>[\w.]+)\s*;").unwrap());

static RUBY_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*def\s+(?P<name>[A-Za-z_][A-Za-z0-9_?!]*)\s*(?:\((?P<params>[^)]*)\))?").unwrap());
static RUBY_REQUIRE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*require(?:_relative)?\s+['"](?P<path>[^'"]+)['"]"#).unwrap());

static PHP_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*function\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<params>[^)]*)\)").unwrap());
static PHP_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*(?:require|include)(?:_once)?\s*\(?\s*['"](?P<path>[^'"]+)['"]"#).unwrap());

static SWIFT_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*func\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<params>[^)]*)\)").unwrap());
static SWIFT_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*import\s+(?P<path>[\w.]+)").unwrap());

static SCALA_FUNCTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*def\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<params>[^)]*)\)").unwrap());
static SCALA_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*import\s+(?P<path>[\w.{}, ]+)").unwrap());

fn syntax_for(language: Language) -> LangSyntax {
    match language {
        Language::C | Language::Cpp => LangSyntax {
            function_header: &C_FUNCTION,
            import_line: &C_INCLUDE,
            import_kind: ImportKind::IncludeSystem,
        },
        Language::CSharp => LangSyntax {
            function_header: &CSHARP_FUNCTION,
            import_line: &CSHARP_USING,
            import_kind: ImportKind::Using,
        },
        Language::Ruby => LangSyntax {
            function_header: &RUBY_FUNCTION,
            import_line: &RUBY_REQUIRE,
            import_kind: ImportKind::Require,
        },
        Language::Php => LangSyntax {
            function_header: &PHP_FUNCTION,
            import_line: &PHP_INCLUDE,
            import_kind: ImportKind::IncludeLocal,
        },
        Language::Swift => LangSyntax {
            function_header: &SWIFT_FUNCTION,
            import_line: &SWIFT_IMPORT,
            import_kind: ImportKind::Import,
        },
        Language::Scala => LangSyntax {
            function_header: &SCALA_FUNCTION,
            import_line: &SCALA_IMPORT,
            import_kind: ImportKind::Import,
        },
        _ => unreachable!("RegexFallbackPlugin only constructed for fallback languages"),
    }
}

fn parse_params(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| {
            // Best-effort: the last whitespace-or-colon-separated token that
            // looks like an identifier is usually the parameter name across
            // C/C#/Swift/Scala signatures; Ruby/PHP params are bare already.
            p.split(|c: char| c == ':' || c == ' ')
                .filter(|t| !t.is_empty())
                .last()
                .unwrap_or(p)
                .trim_start_matches('$')
                .trim_start_matches('*')
                .trim_start_matches('&')
                .to_string()
        })
        .collect()
}

/// One extractor shared by every grammar-less language; `language` picks
/// which fixed regex table from §4.1 to use.
pub struct RegexFallbackPlugin {
    language: Language,
}

impl RegexFallbackPlugin {
    pub fn new(language: Language) -> Self {
        assert!(
            !language.has_grammar() && !language.is_luau(),
            "RegexFallbackPlugin is only for languages without a wired-up grammar"
        );
        Self { language }
    }
}

impl LanguagePlugin for RegexFallbackPlugin {
    fn language(&self) -> Language {
        self.language
    }

    fn extract_facts(&self, source: &str, file_path: &str) -> FileFacts {
        let content_hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        let mut facts = FileFacts::empty(file_path.to_string(), content_hash, self.language);
        let syntax = syntax_for(self.language);

        let mut current_fn: Option<(String, u32)> = None;
        for (idx, line) in source.lines().enumerate() {
            let line_no = idx as u32 + 1;
            if let Some(caps) = syntax.function_header.captures(line) {
                if let Some((prev_name, prev_start)) = current_fn.take() {
                    facts.functions.push(FunctionFact::new(
                        prev_name,
                        Vec::new(),
                        prev_start,
                        line_no.saturating_sub(1).max(prev_start),
                        self.language,
                        file_path,
                    ));
                }
                let name = caps.name("name").map(|m| m.as_str().to_string()).unwrap_or_default();
                let params = caps.name("params").map(|m| parse_params(m.as_str())).unwrap_or_default();
                facts.functions.push(FunctionFact::new(name.clone(), params, line_no, line_no, self.language, file_path));
                current_fn = Some((name, line_no));
            }
        }

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx as u32 + 1;
            for caps in CALL_SITE.captures_iter(line) {
                let callee = caps.get(1).unwrap().as_str();
                if syntax.function_header.is_match(line) {
                    continue;
                }
                facts.intra_calls.push(CallEdge::new(None, callee, line_no, caps.get(1).unwrap().start() as u32));
            }
        }

        facts.imports = self.parse_imports(source);
        facts
    }

    fn parse_imports(&self, source: &str) -> Vec<ImportFact> {
        let syntax = syntax_for(self.language);
        let mut imports = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if let Some(caps) = syntax.import_line.captures(line) {
                let path = caps.name("path").map(|m| m.as_str().to_string()).unwrap_or_default();
                imports.push(ImportFact::new(syntax.import_kind, path, idx as u32 + 1));
            }
        }
        imports
    }

    fn syntax_profile(&self) -> Option<&SyntaxProfile> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_function_and_include() {
        let plugin = RegexFallbackPlugin::new(Language::C);
        let source = "#include <stdio.h>\n\nint add(int a, int b) {\n    return a + b;\n}\n";
        let facts = plugin.extract_facts(source, "add.c");
        assert!(facts.functions.iter().any(|f| f.name == "add"));
        assert_eq!(facts.imports.len(), 1);
        assert_eq!(facts.imports[0].module, "stdio.h");
    }

    #[test]
    fn test_ruby_function_and_require() {
        let plugin = RegexFallbackPlugin::new(Language::Ruby);
        let source = "require 'json'\n\ndef greet(name)\n  puts name\nend\n";
        let facts = plugin.extract_facts(source, "greet.rb");
        assert!(facts.functions.iter().any(|f| f.name == "greet"));
        assert_eq!(facts.imports[0].module, "json");
    }

    #[test]
    fn test_swift_function() {
        let plugin = RegexFallbackPlugin::new(Language::Swift);
        let source = "import Foundation\n\nfunc add(a: Int, b: Int) -> Int {\n    return a + b\n}\n";
        let facts = plugin.extract_facts(source, "Add.swift");
        assert!(facts.functions.iter().any(|f| f.name == "add"));
    }

    #[test]
    #[should_panic]
    fn test_rejects_grammar_backed_language() {
        RegexFallbackPlugin::new(Language::Python);
    }
}
