//! The per-file fact model: the concrete, tagged record types produced by
//! extraction. Unlike a generic node/edge IR, these are plain structs with
//! typed vectors; `language` only changes which extractor produced them,
//! never the shape of the record.

use serde::{Deserialize, Serialize};

use crate::shared::ports::language::Language;

/// A function or method definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionFact {
    pub name: String,
    pub params: Vec<String>,
    pub is_async: bool,
    pub start_line: u32,
    pub end_line: u32,
    pub language: Language,
    pub owning_file: String,
    pub docstring: Option<String>,
}

impl FunctionFact {
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        start_line: u32,
        end_line: u32,
        language: Language,
        owning_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            is_async: false,
            start_line,
            end_line,
            language,
            owning_file: owning_file.into(),
            docstring: None,
        }
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn with_docstring(mut self, doc: Option<String>) -> Self {
        self.docstring = doc;
        self
    }
}

/// A class (or struct/interface where the language extractor chooses to
/// model it this way) with its methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFact {
    pub name: String,
    pub methods: Vec<FunctionFact>,
    pub start_line: u32,
    pub end_line: u32,
}

impl ClassFact {
    pub fn new(name: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            start_line,
            end_line,
        }
    }
}

/// An import/include/use statement, language-tagged by its surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Import,
    FromImport,
    Require,
    Use,
    IncludeSystem,
    IncludeLocal,
    Service,
    Using,
    ExternCrate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportFact {
    pub kind: ImportKind,
    pub module: String,
    pub name: Option<String>,
    pub alias: Option<String>,
    pub line: u32,
}

impl ImportFact {
    pub fn new(kind: ImportKind, module: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            module: module.into(),
            name: None,
            alias: None,
            line,
        }
    }
}

/// An intra-file call observed while walking a function body. `callee_name`
/// may be qualified (`obj.method`, `pkg::f`) — the cross-file resolver
/// splits receiver from member name itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller_function: Option<String>,
    pub callee_name: String,
    pub line: u32,
    pub column: u32,
}

impl CallEdge {
    pub fn new(
        caller_function: Option<String>,
        callee_name: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            caller_function,
            callee_name: callee_name.into(),
            line,
            column,
        }
    }

    /// Splits a possibly-qualified callee name into (receiver, member).
    /// `obj.method` -> `(Some("obj"), "method")`; `pkg::f` -> `(Some("pkg"), "f")`;
    /// a bare `f` -> `(None, "f")`.
    pub fn split_qualifier(&self) -> (Option<&str>, &str) {
        for sep in ["::", ".", ":"] {
            if let Some(idx) = self.callee_name.rfind(sep) {
                return (
                    Some(&self.callee_name[..idx]),
                    &self.callee_name[idx + sep.len()..],
                );
            }
        }
        (None, &self.callee_name)
    }
}

/// The immutable summary of a single source file's extracted structure.
/// Keyed by `(path, content_hash)` by whoever stores it (the content-hashed
/// cache); this struct itself carries the hash as a field for convenience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    pub path: String,
    pub content_hash: String,
    pub language: Language,
    pub functions: Vec<FunctionFact>,
    pub classes: Vec<ClassFact>,
    pub imports: Vec<ImportFact>,
    pub intra_calls: Vec<CallEdge>,
}

impl FileFacts {
    pub fn empty(path: impl Into<String>, content_hash: impl Into<String>, language: Language) -> Self {
        Self {
            path: path.into(),
            content_hash: content_hash.into(),
            language,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            intra_calls: Vec::new(),
        }
    }

    /// All functions, including those nested under classes as methods.
    pub fn all_functions(&self) -> Vec<&FunctionFact> {
        let mut out: Vec<&FunctionFact> = self.functions.iter().collect();
        for class in &self.classes {
            out.extend(class.methods.iter());
        }
        out
    }
}

/// Cross-file call edge: a 4-tuple identifying a resolved call. Set
/// semantics — duplicates collapse when stored in a HashSet/BTreeSet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedEdge {
    pub src_file: String,
    pub src_func: String,
    pub dst_file: String,
    pub dst_func: String,
}

impl ResolvedEdge {
    pub fn new(
        src_file: impl Into<String>,
        src_func: impl Into<String>,
        dst_file: impl Into<String>,
        dst_func: impl Into<String>,
    ) -> Self {
        Self {
            src_file: src_file.into(),
            src_func: src_func.into(),
            dst_file: dst_file.into(),
            dst_func: dst_func.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualifier_method_call() {
        let edge = CallEdge::new(Some("helloWorld".into()), "res.send", 1, 10);
        assert_eq!(edge.split_qualifier(), (Some("res"), "send"));
    }

    #[test]
    fn test_split_qualifier_rust_path() {
        let edge = CallEdge::new(None, "pkg::f", 1, 0);
        assert_eq!(edge.split_qualifier(), (Some("pkg"), "f"));
    }

    #[test]
    fn test_split_qualifier_bare_name() {
        let edge = CallEdge::new(None, "helper", 1, 0);
        assert_eq!(edge.split_qualifier(), (None, "helper"));
    }

    #[test]
    fn test_all_functions_includes_methods() {
        let mut file = FileFacts::empty("a.py", "hash1", Language::Python);
        let mut class = ClassFact::new("Foo", 1, 10);
        class
            .methods
            .push(FunctionFact::new("bar", vec![], 2, 3, Language::Python, "a.py"));
        file.classes.push(class);
        file.functions
            .push(FunctionFact::new("top", vec![], 12, 13, Language::Python, "a.py"));
        assert_eq!(file.all_functions().len(), 2);
    }
}
