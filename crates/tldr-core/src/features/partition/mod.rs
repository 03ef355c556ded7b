//! Durability Partitioner (C5): routes resolved edges to a durable
//! (vendored/dependency) partition or the volatile (user-code) partition, so
//! that file-watch events never trigger reindexing of code the workspace
//! didn't write.
//!
//! A path is durable iff, after normalizing separators to `/`, any of a
//! fixed set of substrings appears in it — the same directories every
//! language's package manager vendors third-party code into.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::shared::models::ResolvedEdge;

const DURABLE_MARKERS: &[&str] = &[
    "node_modules/",
    ".venv/",
    "venv/",
    "vendor/",
    "__pycache__/",
    "site-packages/",
    ".tox/",
    "dist-packages/",
];

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn is_durable(path: &str) -> bool {
    let normalized = normalize(path);
    DURABLE_MARKERS.iter().any(|marker| normalized.contains(marker))
}

/// Extracts the package key a durable path belongs to, or `None` for a
/// volatile path. See spec examples: `node_modules/@types/react/index.d.ts`
/// -> `@types/react`; `vendor/github.com/pkg/errors/errors.go` ->
/// `github.com/pkg/errors`.
pub fn package_key(path: &str) -> Option<String> {
    let normalized = normalize(path);
    if !is_durable(&normalized) {
        return None;
    }

    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(idx) = segments.iter().position(|s| *s == "node_modules") {
        let first = segments.get(idx + 1)?;
        if let Some(scope) = first.strip_prefix('@') {
            let name = segments.get(idx + 2)?;
            return Some(format!("@{scope}/{name}"));
        }
        return Some((*first).to_string());
    }

    if let Some(idx) = segments.iter().position(|s| *s == "site-packages") {
        return segments.get(idx + 1).map(|s| s.to_string());
    }

    if let Some(idx) = segments.iter().position(|s| *s == "vendor") {
        let a = segments.get(idx + 1)?;
        if a.contains('.') {
            let b = segments.get(idx + 2)?;
            let c = segments.get(idx + 3)?;
            return Some(format!("{a}/{b}/{c}"));
        }
        return Some((*a).to_string());
    }

    segments.first().map(|s| s.to_string())
}

/// One package's worth of resolved edges, keyed by the file that produced
/// them so a package can be dropped wholesale when it's uninstalled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurablePartition {
    pub package_key: String,
    pub edges_by_file: HashMap<String, Vec<ResolvedEdge>>,
}

impl DurablePartition {
    pub fn new(package_key: impl Into<String>) -> Self {
        Self { package_key: package_key.into(), edges_by_file: HashMap::new() }
    }

    pub fn insert(&mut self, src_file: impl Into<String>, edge: ResolvedEdge) {
        self.edges_by_file.entry(src_file.into()).or_default().push(edge);
    }

    pub fn all_edges(&self) -> Vec<ResolvedEdge> {
        self.edges_by_file.values().flatten().cloned().collect()
    }
}

/// The user-code side of the split: one flat collection of edges, no
/// per-package subdivision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolatilePartition {
    pub edges: Vec<ResolvedEdge>,
}

impl VolatilePartition {
    pub fn insert(&mut self, edge: ResolvedEdge) {
        self.edges.push(edge);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionedIndex {
    pub durable: HashMap<String, DurablePartition>,
    pub volatile: VolatilePartition,
}

impl PartitionedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one `ResolvedEdge` by its `src_file`'s durability.
    pub fn route(&mut self, edge: ResolvedEdge) {
        match package_key(&edge.src_file) {
            Some(key) => self.durable.entry(key.clone()).or_insert_with(|| DurablePartition::new(key)).insert(edge.src_file.clone(), edge),
            None => self.volatile.insert(edge),
        }
    }

    pub fn route_all(&mut self, edges: impl IntoIterator<Item = ResolvedEdge>) {
        for edge in edges {
            self.route(edge);
        }
    }

    /// Drops durable files from a dirty-file batch: durable partitions are
    /// never invalidated by file-watch events, since vendored/dependency
    /// code doesn't change except via a reinstall, which is detected
    /// separately (absence of the source directory).
    pub fn filter_reindexable<'a>(&self, dirty_files: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        dirty_files.into_iter().filter(|path| !is_durable(path)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_durable_matches_fixed_marker_list() {
        assert!(is_durable("project/node_modules/lodash/index.js"));
        assert!(is_durable("project\\vendor\\github.com\\pkg\\errors\\errors.go"));
        assert!(!is_durable("project/src/main.rs"));
    }

    #[test]
    fn test_package_key_node_modules_scoped() {
        assert_eq!(package_key("node_modules/@types/react/index.d.ts"), Some("@types/react".to_string()));
    }

    #[test]
    fn test_package_key_node_modules_unscoped() {
        assert_eq!(package_key("project/node_modules/lodash/index.js"), Some("lodash".to_string()));
    }

    #[test]
    fn test_package_key_vendor_go_style() {
        assert_eq!(package_key("vendor/github.com/pkg/errors/errors.go"), Some("github.com/pkg/errors".to_string()));
    }

    #[test]
    fn test_package_key_vendor_non_go_takes_first_segment() {
        assert_eq!(package_key("vendor/somevendor/file.rb"), Some("somevendor".to_string()));
    }

    #[test]
    fn test_package_key_site_packages() {
        assert_eq!(package_key(".venv/lib/site-packages/numpy/core.py"), Some("numpy".to_string()));
    }

    #[test]
    fn test_package_key_none_for_volatile_path() {
        assert_eq!(package_key("src/main.rs"), None);
    }

    #[test]
    fn test_filter_reindexable_drops_durable_paths() {
        let index = PartitionedIndex::new();
        let result = index.filter_reindexable(["src/main.rs", "node_modules/lodash/index.js"]);
        assert_eq!(result, vec!["src/main.rs"]);
    }

    #[test]
    fn test_route_splits_by_durability() {
        let mut index = PartitionedIndex::new();
        index.route(ResolvedEdge::new("node_modules/lodash/index.js", "debounce", "a.js", "f"));
        index.route(ResolvedEdge::new("src/main.rs", "run", "src/lib.rs", "helper"));
        assert_eq!(index.durable.get("lodash").unwrap().all_edges().len(), 1);
        assert_eq!(index.volatile.edges.len(), 1);
    }
}
