//! Utility modules shared across features
//!
//! - `id_generator`: deterministic ID generation
//! - `scope_stack`: scope management for FQN resolution
//! - `tree_sitter`: tree-sitter AST traversal and text/span extraction

pub mod id_generator;
pub mod scope_stack;
pub mod tree_sitter;
