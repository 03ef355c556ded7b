//! Port definitions for the program-dependence graph feature (C3).

use crate::shared::models::{CFGInfo, DFGInfo, PDGInfo};

pub trait PDGBuilder {
    fn build(&self, cfg: CFGInfo, dfg: DFGInfo) -> PDGInfo;
}

pub struct GenericPDGBuilder;

impl PDGBuilder for GenericPDGBuilder {
    fn build(&self, cfg: CFGInfo, dfg: DFGInfo) -> PDGInfo {
        super::infrastructure::generic_pdg_builder::build_pdg(cfg, dfg)
    }
}
