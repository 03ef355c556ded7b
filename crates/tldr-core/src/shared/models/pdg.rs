//! Program dependence graph types: CFG+DFG wrapped with block-granularity
//! control and data dependence edges.

use serde::{Deserialize, Serialize};

use crate::shared::models::cfg::CFGInfo;
use crate::shared::models::dfg::DFGInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    Control,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PDGEdge {
    pub src_block: String,
    pub dst_block: String,
    pub dep_type: DepType,
    pub label: String,
}

impl PDGEdge {
    pub fn new(
        src_block: impl Into<String>,
        dst_block: impl Into<String>,
        dep_type: DepType,
        label: impl Into<String>,
    ) -> Self {
        Self {
            src_block: src_block.into(),
            dst_block: dst_block.into(),
            dep_type,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PDGInfo {
    pub cfg: CFGInfo,
    pub dfg: DFGInfo,
    pub edges: Vec<PDGEdge>,
}
