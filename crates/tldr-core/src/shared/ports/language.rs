//! Language abstraction: the fixed extension table the Language Registry
//! (C1) dispatches on, plus which languages have a real grammar-based
//! extractor versus a regex-fallback one.

use serde::{Deserialize, Serialize};

/// Supported programming languages. `.luau` is distinct from `.lua` and must
/// never fall back to it — Luau's type annotations, generics, `continue`,
/// and compound assignment need a dedicated extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Lua,
    Luau,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Lua => "lua",
            Language::Luau => "luau",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cxx", "cc", "hpp"],
            Language::CSharp => &["cs"],
            Language::Ruby => &["rb"],
            Language::Php => &["php"],
            Language::Swift => &["swift"],
            Language::Kotlin => &["kt", "kts"],
            Language::Scala => &["scala", "sc"],
            Language::Lua => &["lua"],
            Language::Luau => &["luau"],
        }
    }

    /// Dispatch table from §4.1. `.luau` has its own match arm ahead of
    /// `.lua`, so it never falls through to the Lua variant.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Language::Python),
            "ts" | "tsx" => Some(Language::TypeScript),
            "js" | "jsx" => Some(Language::JavaScript),
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "c" | "h" => Some(Language::C),
            "cpp" | "cxx" | "cc" | "hpp" => Some(Language::Cpp),
            "cs" => Some(Language::CSharp),
            "rb" => Some(Language::Ruby),
            "php" => Some(Language::Php),
            "swift" => Some(Language::Swift),
            "kt" | "kts" => Some(Language::Kotlin),
            "scala" | "sc" => Some(Language::Scala),
            "luau" => Some(Language::Luau),
            "lua" => Some(Language::Lua),
            _ => None,
        }
    }

    pub fn from_file_path(path: &str) -> Option<Self> {
        path.rsplit('.').next().and_then(Self::from_extension)
    }

    /// Languages with a real tree-sitter grammar wired up. Everything else
    /// degrades to the regex-fallback extractor described in §4.1.
    pub fn has_grammar(&self) -> bool {
        matches!(
            self,
            Language::Python
                | Language::TypeScript
                | Language::JavaScript
                | Language::Rust
                | Language::Go
                | Language::Java
                | Language::Kotlin
                | Language::Lua
        )
    }

    /// Luau never has a tree-sitter grammar in this registry (none exists
    /// upstream); it is handled by a dedicated structural extractor that is
    /// neither the grammar path nor the generic regex fallback.
    pub fn is_luau(&self) -> bool {
        matches!(self, Language::Luau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("xyz"), None);
    }

    #[test]
    fn test_from_file_path() {
        assert_eq!(
            Language::from_file_path("src/main.py"),
            Some(Language::Python)
        );
        assert_eq!(
            Language::from_file_path("app.tsx"),
            Some(Language::TypeScript)
        );
    }

    #[test]
    fn test_luau_does_not_fall_back_to_lua() {
        assert_eq!(Language::from_extension("luau"), Some(Language::Luau));
        assert_ne!(Language::from_extension("luau"), Some(Language::Lua));
    }

    #[test]
    fn test_go_vendor_extension() {
        assert_eq!(
            Language::from_file_path("vendor/github.com/pkg/errors/errors.go"),
            Some(Language::Go)
        );
    }

    #[test]
    fn test_grammar_coverage() {
        assert!(Language::Python.has_grammar());
        assert!(!Language::Ruby.has_grammar());
        assert!(!Language::Luau.has_grammar());
        assert!(Language::Luau.is_luau());
    }
}
