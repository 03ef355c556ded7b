//! Core fact-extraction and graph-construction engine.
//!
//! Feature-first layout:
//! - `shared`   - common fact/graph model types, zero external deps beyond serde
//! - `features` - one module per pipeline stage (parsing, flow graph, ...)

#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]

pub mod features;
pub mod shared;

pub use features::parsing::create_full_registry;
