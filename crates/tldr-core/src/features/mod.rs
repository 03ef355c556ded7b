//! Feature modules - each is a vertical slice from raw source to a fact or
//! graph type in `shared::models`.

pub mod cache;
pub mod cross_file;
pub mod data_flow;
pub mod flow_graph;
pub mod parsing;
pub mod partition;
pub mod pdg;
pub mod query_cache;
pub mod slicing;
pub mod workspace;

pub mod file_watcher;
