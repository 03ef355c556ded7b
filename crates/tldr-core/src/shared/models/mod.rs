//! Shared data model: the concrete fact types extraction produces, plus the
//! CFG/DFG/PDG graph types built from them.

pub mod cfg;
pub mod dfg;
pub mod error;
pub mod facts;
pub mod pdg;
mod span;

pub use cfg::{CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind, CFGInfo};
pub use dfg::{DataflowEdge, DFGInfo, RefType, VarRef};
pub use error::{CoreError, ErrorKind, Result};
pub use facts::{
    CallEdge, ClassFact, FileFacts, FunctionFact, ImportFact, ImportKind, ResolvedEdge,
};
pub use pdg::{DepType, PDGEdge, PDGInfo};
pub use span::{Location, Span};

pub use crate::shared::ports::language::Language;
pub use serde_json::Value;
