//! Content-hashed `FileFacts` cache (C6).
//!
//! One flat persisted `path -> (content_hash, FileFacts)` map: a file is a
//! cache hit only when its current content hash matches the stored one.
//! There's no tiered session/adaptive/disk split here — re-extraction is
//! fast enough that a single `DashMap` plus one JSON file on disk covers it.

pub mod fingerprint;
pub mod store;

pub use fingerprint::{hash_bytes, hash_file, read_and_hash};
pub use store::FactsCache;
