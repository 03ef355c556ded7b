//! Layered, queryable storage for the resolved cross-file call graph.
//!
//! The stacked snapshot DB (`stacked_db`) is the only concern this crate
//! owns: a project's `ResolvedEdge`s live here across fork/rollback/compact
//! operations, independent of how they were produced (`tldr-core`'s
//! extraction and cross-file resolution) or how they get durably split by
//! package (the durability partitioner, also in `tldr-core`).

pub mod stacked_db;

pub use stacked_db::{Edge, ImmutableStack, StackedDb};
