//! Cross-file call resolution (C4): turns each file's intra-file `CallEdge`s
//! into project-wide `ResolvedEdge`s by looking up callee names in a symbol
//! table built from every indexed file.
//!
//! Ambiguity is resolved, never guessed around: a same-file definition always
//! wins; otherwise the shortest, then lexicographically first, defining path
//! is chosen. A callee with no definition anywhere in the project is simply
//! absent from the result — it is never attributed to the wrong file.

pub mod infrastructure;
pub mod ports;

pub use infrastructure::resolver::{resolve_calls, resolve_project};
pub use infrastructure::symbol_table::{Definition, SymbolTable};
pub use ports::{CrossFileResolver, GenericCrossFileResolver};
