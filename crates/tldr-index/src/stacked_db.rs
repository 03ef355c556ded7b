//! Stacked Snapshot DB (C7): an append-mostly, layered store of
//! `ResolvedEdge`s supporting cheap fork/rollback and point-in-time queries.
//!
//! Each `ImmutableStack` is a layer of edges added plus a set of edge ids
//! deleted, with a single parent link — never a parent back-reference, so the
//! stack chain can never cycle. Only the current top layer is ever mutated;
//! every other layer, once it stops being top, is frozen. Visibility is
//! resolved top-to-root: a later (closer to top) deletion shadows an edge
//! added by an earlier ancestor, even the root.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tldr_core::shared::models::ResolvedEdge;

/// A `ResolvedEdge` plus a stable id, so a later layer can reference it for
/// deletion without needing to match on the edge's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub resolved: ResolvedEdge,
}

impl Edge {
    pub fn new(resolved: ResolvedEdge) -> Self {
        Self { id: Uuid::new_v4(), resolved }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmutableStack {
    pub id: Uuid,
    pub parent: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub edges: Vec<Edge>,
    pub deletions: HashSet<Uuid>,
}

impl ImmutableStack {
    fn root() -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: None,
            created_at: Utc::now(),
            edges: Vec::new(),
            deletions: HashSet::new(),
        }
    }

    fn child_of(parent: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: Some(parent),
            created_at: Utc::now(),
            edges: Vec::new(),
            deletions: HashSet::new(),
        }
    }
}

/// The layered database. Cloning a `StackedDb` clones the whole stack map —
/// cheap relative to re-extracting a project, since layers hold edge ids and
/// resolved edges, never source text or graphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackedDb {
    stacks: HashMap<Uuid, ImmutableStack>,
    top: Uuid,
}

impl StackedDb {
    pub fn new() -> Self {
        let root = ImmutableStack::root();
        let top = root.id;
        let mut stacks = HashMap::new();
        stacks.insert(top, root);
        Self { stacks, top }
    }

    pub fn top_id(&self) -> Uuid {
        self.top
    }

    /// Number of layers from the top down to (and including) the root.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.stacks[&self.top].parent;
        while let Some(id) = current {
            depth += 1;
            current = self.stacks[&id].parent;
        }
        depth
    }

    fn top_mut(&mut self) -> &mut ImmutableStack {
        self.stacks.get_mut(&self.top).expect("top stack id always present")
    }

    /// Adds an edge to the topmost (writable) stack, returning its new id.
    pub fn add_edge(&mut self, resolved: ResolvedEdge) -> Uuid {
        let edge = Edge::new(resolved);
        let id = edge.id;
        self.top_mut().edges.push(edge);
        id
    }

    /// Marks an edge id as deleted in the topmost stack. A no-op, not an
    /// error, if that id was never visible from here (already shadowed, or
    /// never existed) — deletions are tombstones, not assertions.
    pub fn remove_edge(&mut self, edge_id: Uuid) {
        self.top_mut().deletions.insert(edge_id);
    }

    fn edges_visible_from(&self, start: Uuid) -> Vec<ResolvedEdge> {
        let mut shadowed: HashSet<Uuid> = HashSet::new();
        let mut visible: HashMap<Uuid, ResolvedEdge> = HashMap::new();
        let mut current = Some(start);
        while let Some(id) = current {
            let stack = &self.stacks[&id];
            for edge in &stack.edges {
                if !shadowed.contains(&edge.id) {
                    visible.entry(edge.id).or_insert_with(|| edge.resolved.clone());
                }
            }
            shadowed.extend(stack.deletions.iter().copied());
            current = stack.parent;
        }
        visible.into_values().collect()
    }

    /// The edge set visible from the current top: the top-to-root fold
    /// described in the data model, where a descendant's deletion always
    /// wins over an ancestor's addition.
    pub fn get_all_edges(&self) -> Vec<ResolvedEdge> {
        self.edges_visible_from(self.top)
    }

    /// A cheap speculative branch: a new DB whose top has this DB's current
    /// top as parent. The two DBs share no mutable state once forked.
    pub fn fork(&self) -> Self {
        let child = ImmutableStack::child_of(self.top);
        let mut stacks = self.stacks.clone();
        let top = child.id;
        stacks.insert(top, child);
        Self { stacks, top }
    }

    /// Moves the top pointer to the current top's parent. At the root,
    /// returns a fresh empty DB rather than erroring — there's nowhere left
    /// to roll back to.
    pub fn rollback(&self) -> Self {
        match self.stacks[&self.top].parent {
            Some(parent) => Self { stacks: self.stacks.clone(), top: parent },
            None => Self::new(),
        }
    }

    /// Flattens the currently visible edge set into a single root stack,
    /// discarding history and deletions. Depth after compaction is always 1.
    pub fn compact(&self) -> Self {
        let mut db = Self::new();
        for edge in self.get_all_edges() {
            db.add_edge(edge);
        }
        db
    }

    /// The visible edge set as of a specific stack layer, or `None` if that
    /// layer id doesn't exist in this DB's history at all.
    pub fn query_at_stack(&self, id: Uuid) -> Option<Vec<ResolvedEdge>> {
        if !self.stacks.contains_key(&id) {
            return None;
        }
        Some(self.edges_visible_from(id))
    }

    /// The visible edge set as of the most recent ancestor of the current
    /// top whose `created_at <= t`. If every ancestor postdates `t`, the
    /// result is empty.
    pub fn query_at_time(&self, t: DateTime<Utc>) -> Vec<ResolvedEdge> {
        let mut current = Some(self.top);
        while let Some(id) = current {
            let stack = &self.stacks[&id];
            if stack.created_at <= t {
                return self.edges_visible_from(id);
            }
            current = stack.parent;
        }
        Vec::new()
    }
}

impl Default for StackedDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(src_func: &str) -> ResolvedEdge {
        ResolvedEdge::new("a.py", src_func, "b.py", "helper")
    }

    #[test]
    fn test_get_all_edges_reflects_single_layer_writes() {
        let mut db = StackedDb::new();
        db.add_edge(edge("run"));
        assert_eq!(db.get_all_edges().len(), 1);
        assert_eq!(db.depth(), 1);
    }

    #[test]
    fn test_stacked_rollback_discards_only_the_forked_layer() {
        let mut db = StackedDb::new();
        let a = db.add_edge(edge("a"));
        let mut forked = db.fork();
        forked.add_edge(edge("b"));
        assert_eq!(forked.get_all_edges().len(), 2);

        let rolled_back = forked.rollback();
        let edges = rolled_back.get_all_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0], edge("a"));
        let _ = a;
    }

    #[test]
    fn test_rollback_at_root_returns_empty_db() {
        let db = StackedDb::new();
        let rolled_back = db.rollback();
        assert!(rolled_back.get_all_edges().is_empty());
        assert_eq!(rolled_back.depth(), 1);
    }

    #[test]
    fn test_deletion_in_descendant_shadows_ancestor_addition() {
        let mut db = StackedDb::new();
        let id = db.add_edge(edge("a"));
        let mut forked = db.fork();
        forked.remove_edge(id);
        assert!(forked.get_all_edges().is_empty());
        assert_eq!(db.get_all_edges().len(), 1);
    }

    #[test]
    fn test_compact_preserves_visible_edges_and_flattens_depth() {
        let mut db = StackedDb::new();
        let id = db.add_edge(edge("a"));
        let mut forked = db.fork();
        forked.add_edge(edge("b"));
        forked.remove_edge(id);

        let compacted = forked.compact();
        assert_eq!(compacted.depth(), 1);
        let edges = compacted.get_all_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0], edge("b"));
    }

    #[test]
    fn test_query_at_stack_returns_none_for_unknown_id() {
        let db = StackedDb::new();
        assert!(db.query_at_stack(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_query_at_stack_matches_get_all_edges_for_current_top() {
        let mut db = StackedDb::new();
        db.add_edge(edge("a"));
        assert_eq!(db.query_at_stack(db.top_id()).unwrap(), db.get_all_edges());
    }

    #[test]
    fn test_query_at_time_before_any_layer_is_empty() {
        let mut db = StackedDb::new();
        db.add_edge(edge("a"));
        let before_root = db.stacks[&db.top].created_at - chrono::Duration::seconds(10);
        assert!(db.query_at_time(before_root).is_empty());
    }
}
