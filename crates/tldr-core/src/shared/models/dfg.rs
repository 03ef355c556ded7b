//! Data-flow graph types: variable references and reaching-definition edges.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Definition,
    Use,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRef {
    pub name: String,
    pub ref_type: RefType,
    pub line: u32,
    pub column: u32,
}

impl VarRef {
    pub fn new(name: impl Into<String>, ref_type: RefType, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            ref_type,
            line,
            column,
        }
    }

    pub fn is_definition(&self) -> bool {
        matches!(self.ref_type, RefType::Definition)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataflowEdge {
    pub var_name: String,
    pub def_site: (u32, u32),
    pub use_site: (u32, u32),
}

impl DataflowEdge {
    pub fn new(var_name: impl Into<String>, def_site: (u32, u32), use_site: (u32, u32)) -> Self {
        Self {
            var_name: var_name.into(),
            def_site,
            use_site,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DFGInfo {
    pub function_name: String,
    pub var_refs: Vec<VarRef>,
    pub dataflow_edges: Vec<DataflowEdge>,
}

impl DFGInfo {
    pub fn empty(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            var_refs: Vec::new(),
            dataflow_edges: Vec::new(),
        }
    }
}
