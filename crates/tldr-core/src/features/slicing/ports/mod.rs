//! Port definitions for the program-slicing feature.

use crate::shared::models::PDGInfo;

use super::infrastructure::slicer::{SliceDirection, SliceResult};

pub trait Slicer {
    fn slice(&self, pdg: &PDGInfo, seed_block: &str, direction: SliceDirection, variable: Option<&str>) -> SliceResult;
}

pub struct GenericSlicer;

impl Slicer for GenericSlicer {
    fn slice(&self, pdg: &PDGInfo, seed_block: &str, direction: SliceDirection, variable: Option<&str>) -> SliceResult {
        super::infrastructure::slicer::slice(pdg, seed_block, direction, variable)
    }
}
