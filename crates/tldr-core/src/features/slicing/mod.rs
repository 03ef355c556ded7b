//! Program slicing: backward/forward reachability over a `PDGInfo`, serving
//! the `slice(file, function, line, direction, variable?)` query operation.

pub mod infrastructure;
pub mod ports;

pub use infrastructure::slicer::{slice, SliceDirection, SliceResult};
pub use ports::{GenericSlicer, Slicer};
