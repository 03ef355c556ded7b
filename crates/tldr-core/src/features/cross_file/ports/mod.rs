//! Port definitions for the cross-file resolver feature (C4).

use crate::shared::models::{FileFacts, ResolvedEdge};

/// Resolves intra-file calls across an entire project's `FileFacts` into
/// cross-file `ResolvedEdge`s. The generic implementation builds one
/// `SymbolTable` from all files and resolves each file's calls against it;
/// there is no per-language variant since resolution runs entirely on the
/// already-extracted fact model.
pub trait CrossFileResolver {
    fn resolve(&self, files: &[FileFacts]) -> Vec<ResolvedEdge>;
}

pub struct GenericCrossFileResolver;

impl CrossFileResolver for GenericCrossFileResolver {
    fn resolve(&self, files: &[FileFacts]) -> Vec<ResolvedEdge> {
        super::infrastructure::resolver::resolve_project(files)
    }
}
