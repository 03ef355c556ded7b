//! Memoizing Query Layer (C8): caches a query's result against the file
//! revisions it read, and discards it the moment any of those revisions
//! moves on.
//!
//! A query here is identified by its operation name plus a canonicalized
//! argument tuple (`canonical_key`) — the twelve operations the daemon
//! exposes (`search`, `extract`, `dead_code`, `architecture`, `cfg`, `dfg`,
//! `slice`, `tree`, `structure`, `context`, `imports`, `importers`) all share
//! this one cache; callers provide the op name, canonicalized args, and the
//! file paths the computation actually reads. There is no per-operation
//! logic here — those live in the daemon's command handlers, which call
//! `QueryCache::get_or_compute` around whatever `tldr-core`/`tldr-index`
//! call they'd otherwise make unconditionally.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

/// Monotonic per-file revision counters. `notify_file_changed` is the sole
/// writer; every cached result's validity is judged against the revisions
/// recorded at computation time.
#[derive(Debug, Default)]
pub struct FileRevisions {
    revisions: DashMap<String, u64>,
}

impl FileRevisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, path: &str) -> u64 {
        *self.revisions.entry(path.to_string()).or_insert(0)
    }

    pub fn notify_file_changed(&self, path: &str) {
        *self.revisions.entry(path.to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone)]
struct CachedResult<V> {
    value: V,
    deps: Vec<(String, u64)>,
}

/// A memoized cache for one result type `V`. The daemon keeps one per
/// distinct result shape (e.g. one for search results, one for CFG
/// summaries) rather than trying to store every operation's differently
/// shaped output in a single map.
#[derive(Debug)]
pub struct QueryCache<V: Clone> {
    entries: DashMap<String, CachedResult<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self { entries: DashMap::new(), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Returns the cached value for `key` if every file it depends on is
    /// still at the revision recorded when it was computed; otherwise runs
    /// `compute`, records the current revisions of `deps`, and caches it.
    pub fn get_or_compute(
        &self,
        key: impl Into<String>,
        deps: &[&str],
        revisions: &FileRevisions,
        compute: impl FnOnce() -> V,
    ) -> V {
        let key = key.into();
        if let Some(entry) = self.entries.get(&key) {
            let still_valid = entry.deps.iter().all(|(path, rev)| revisions.current(path) == *rev);
            if still_valid {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.value.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        let deps_snapshot = deps.iter().map(|path| (path.to_string(), revisions.current(path))).collect();
        self.entries.insert(key, CachedResult { value: value.clone(), deps: deps_snapshot });
        value
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The twelve memoized operation names the daemon's command dispatch maps to
/// this layer's keys — kept here so op names can't drift between the daemon
/// and its status-output labels.
pub const MEMOIZED_OPERATIONS: &[&str] = &[
    "search", "extract", "dead_code", "architecture", "cfg", "dfg", "slice", "tree", "structure", "context",
    "imports", "importers",
];

/// Builds a cache key from an operation name and its arguments: `name=value`
/// pairs, args sorted by name so argument order never affects the key, and
/// any string-array value sorted too, since every enumerated operation's
/// list-valued arguments (`entry_points`, `extensions`) are order-irrelevant.
pub fn canonical_key(op: &str, mut args: Vec<(&str, Value)>) -> String {
    args.sort_by(|a, b| a.0.cmp(b.0));
    let mut parts = vec![op.to_string()];
    for (name, value) in args {
        let canonical_value = match value {
            Value::Array(mut items) => {
                items.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
                Value::Array(items)
            }
            other => other,
        };
        parts.push(format!("{name}={canonical_value}"));
    }
    parts.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_second_call_without_notify_is_a_hit() {
        let cache: QueryCache<u32> = QueryCache::new();
        let revisions = FileRevisions::new();
        let calls = Cell::new(0);

        let key = canonical_key("search", vec![("pattern", Value::String("foo".into())), ("max_results", Value::from(50))]);
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };

        let first = cache.get_or_compute(key.clone(), &["a.py"], &revisions, compute);
        let second = cache.get_or_compute(key, &["a.py"], &revisions, compute);

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);
    }

    #[test]
    fn test_notify_file_changed_forces_recomputation() {
        let cache: QueryCache<u32> = QueryCache::new();
        let revisions = FileRevisions::new();
        let calls = Cell::new(0);

        let key = canonical_key("extract", vec![("file", Value::String("a.py".into()))]);
        let compute = || {
            calls.set(calls.get() + 1);
            calls.get()
        };

        let first = cache.get_or_compute(key.clone(), &["a.py"], &revisions, compute);
        revisions.notify_file_changed("a.py");
        let second = cache.get_or_compute(key, &["a.py"], &revisions, compute);

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(cache.miss_count(), 2);
    }

    #[test]
    fn test_canonical_key_ignores_argument_order() {
        let a = canonical_key("tree", vec![("exclude_hidden", Value::from(true)), ("extensions", Value::from(vec!["rs", "py"]))]);
        let b = canonical_key("tree", vec![("extensions", Value::from(vec!["py", "rs"])), ("exclude_hidden", Value::from(true))]);
        assert_eq!(a, b);
    }
}
