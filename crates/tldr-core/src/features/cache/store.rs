//! Content-hashed `FileFacts` cache (C6): `path -> (content_hash, FileFacts)`,
//! persisted to a single JSON file and lazily verified against the file's
//! current content hash on load — a stale entry (hash mismatch, or the file
//! missing entirely) is simply treated as a miss rather than an error.
//!
//! The teacher's original cache was a three-tier session/adaptive/disk design
//! built for a Python daemon processing tens of thousands of files per
//! second; this system re-extracts on every content change instead of
//! racing a TTL, so one flat persisted map is sufficient.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::fingerprint::hash_bytes;
use crate::shared::models::error::{CoreError, Result};
use crate::shared::models::FileFacts;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    content_hash: String,
    facts: FileFacts,
}

/// Lock-free concurrent cache keyed by file path. Backed by `DashMap` the
/// same way the parsing feature's registry is, since the daemon extracts
/// many files concurrently via rayon.
pub struct FactsCache {
    entries: DashMap<String, CacheEntry>,
    persist_path: Option<PathBuf>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FactsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            persist_path: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_persist_path(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: DashMap::new(),
            persist_path: Some(path.into()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached facts only if `content_hash` matches what's stored;
    /// a stale or absent entry is `None`, never an error. Tracked so the
    /// daemon's `status` command can report dedup hit/miss counters.
    pub fn get(&self, path: &str, content_hash: &str) -> Option<FileFacts> {
        let hit = self.entries.get(path).and_then(|entry| {
            if entry.content_hash == content_hash {
                Some(entry.facts.clone())
            } else {
                None
            }
        });
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn put(&self, path: impl Into<String>, content_hash: impl Into<String>, facts: FileFacts) {
        self.entries.insert(
            path.into(),
            CacheEntry {
                content_hash: content_hash.into(),
                facts,
            },
        );
    }

    pub fn invalidate(&self, path: &str) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persists the whole cache as one JSON object, path the file given to
    /// `with_persist_path` (or `explicit_path` when provided).
    pub fn save(&self, explicit_path: Option<&Path>) -> Result<()> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| self.persist_path.clone())
            .ok_or_else(|| CoreError::storage("no persist path configured for FactsCache"))?;
        let snapshot: HashMap<String, CacheEntry> =
            self.entries.iter().map(|r| (r.key().clone(), r.value().clone())).collect();
        let json = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Loads a persisted cache. Verification of each entry is lazy: this
    /// loads whatever was on disk unconditionally, and staleness is only
    /// discovered the next time `get()` is called with the file's current
    /// hash.
    pub fn load(explicit_path: Option<&Path>, persist_path: Option<PathBuf>) -> Result<Self> {
        let path = explicit_path.map(Path::to_path_buf).or_else(|| persist_path.clone()).ok_or_else(|| {
            CoreError::storage("no persist path configured for FactsCache")
        })?;
        let bytes = std::fs::read(&path)?;
        let snapshot: HashMap<String, CacheEntry> = serde_json::from_slice(&bytes)?;
        let entries = DashMap::new();
        for (k, v) in snapshot {
            entries.insert(k, v);
        }
        Ok(Self { entries, persist_path, hits: AtomicU64::new(0), misses: AtomicU64::new(0) })
    }

    pub fn hash_source(content: &str) -> String {
        hash_bytes(content.as_bytes())
    }
}

impl Default for FactsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ports::language::Language;

    #[test]
    fn test_get_misses_on_stale_hash() {
        let cache = FactsCache::new();
        let facts = FileFacts::empty("a.py", "h1", Language::Python);
        cache.put("a.py", "h1", facts);
        assert!(cache.get("a.py", "h1").is_some());
        assert!(cache.get("a.py", "h2").is_none());
    }

    #[test]
    fn test_get_misses_on_absent_path() {
        let cache = FactsCache::new();
        assert!(cache.get("nope.py", "h1").is_none());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = FactsCache::new();
        cache.put("a.py", "h1", FileFacts::empty("a.py", "h1", Language::Python));
        cache.invalidate("a.py");
        assert!(cache.get("a.py", "h1").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = FactsCache::new();
        cache.put("a.py", "h1", FileFacts::empty("a.py", "h1", Language::Python));
        cache.save(Some(&path)).unwrap();

        let loaded = FactsCache::load(Some(&path), None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("a.py", "h1").is_some());
    }
}
