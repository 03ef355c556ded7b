//! Project-wide symbol table (C4): maps a defined name to every file/function
//! pair that defines it. Built once per indexing pass from every file's
//! `FileFacts`, then consulted per-file by the resolver.
//!
//! Grounded on the DashMap-backed `name -> FQNs` index the teacher's original
//! symbol index kept for partial-name lookup, simplified to a plain
//! `HashMap<String, Vec<Definition>>` since resolution here runs single-threaded
//! per indexing pass rather than under concurrent mutation.

use std::collections::HashMap;

use crate::shared::models::FileFacts;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Definition {
    pub file: String,
    pub function: String,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<Definition>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(files: &[FileFacts]) -> Self {
        let mut table = Self::new();
        for file in files {
            for func in file.all_functions() {
                table.by_name.entry(func.name.clone()).or_default().push(Definition {
                    file: file.path.clone(),
                    function: func.name.clone(),
                });
            }
        }
        for defs in table.by_name.values_mut() {
            defs.sort();
            defs.dedup();
        }
        table
    }

    pub fn lookup(&self, name: &str) -> &[Definition] {
        self.by_name.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ClassFact, FunctionFact};
    use crate::shared::ports::language::Language;

    #[test]
    fn test_build_indexes_top_level_and_method_functions() {
        let mut a = FileFacts::empty("a.py", "h1", Language::Python);
        a.functions.push(FunctionFact::new("helper", vec![], 1, 2, Language::Python, "a.py"));
        let mut class = ClassFact::new("Widget", 4, 10);
        class.methods.push(FunctionFact::new("render", vec![], 5, 6, Language::Python, "a.py"));
        a.classes.push(class);

        let table = SymbolTable::build(&[a]);
        assert_eq!(table.lookup("helper").len(), 1);
        assert_eq!(table.lookup("render").len(), 1);
        assert!(table.lookup("missing").is_empty());
    }

    #[test]
    fn test_build_collects_every_definer_of_a_shared_name() {
        let mut a = FileFacts::empty("a.py", "h1", Language::Python);
        a.functions.push(FunctionFact::new("run", vec![], 1, 2, Language::Python, "a.py"));
        let mut b = FileFacts::empty("b.py", "h2", Language::Python);
        b.functions.push(FunctionFact::new("run", vec![], 1, 2, Language::Python, "b.py"));

        let table = SymbolTable::build(&[a, b]);
        assert_eq!(table.lookup("run").len(), 2);
    }
}
