//! Program-dependence graph construction (C3): wraps a function's CFG and
//! DFG with derived control- and data-dependence edges.
//!
//! Per §4.3's failure contract: callers that cannot find the requested
//! function should treat this as "no result" rather than calling in here —
//! this module only assembles a PDG from an already-built CFG/DFG pair.

pub mod infrastructure;
pub mod ports;

pub use infrastructure::generic_pdg_builder::build_pdg;
pub use ports::{GenericPDGBuilder, PDGBuilder};
