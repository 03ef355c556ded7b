//! Background reindex trigger (C9): tracks which files changed since the
//! last semantic reindex and fires once the count crosses a threshold.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

pub struct DirtyTracker {
    files: Mutex<HashSet<String>>,
    threshold: usize,
    reindex_in_flight: AtomicBool,
    semantic_enabled: bool,
}

impl DirtyTracker {
    pub fn new(threshold: usize, semantic_enabled: bool) -> Self {
        Self { files: Mutex::new(HashSet::new()), threshold, reindex_in_flight: AtomicBool::new(false), semantic_enabled }
    }

    pub fn dirty_count(&self) -> usize {
        self.files.lock().len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Records a dirty path and reports whether this notification should
    /// trigger a reindex: the count must have crossed the threshold, no
    /// reindex already in flight, and semantic indexing must be enabled.
    /// Notifications always invalidate C8 regardless of this flag.
    pub fn notify(&self, path: &str) -> bool {
        let mut files = self.files.lock();
        files.insert(path.to_string());
        let should_trigger = self.semantic_enabled
            && files.len() >= self.threshold
            && !self.reindex_in_flight.swap(true, Ordering::SeqCst);
        should_trigger
    }

    /// Called once a triggered reindex has completed: resets the dirty set
    /// and the in-flight flag so a future notify can trigger again.
    pub fn reindex_completed(&self) {
        self.files.lock().clear();
        self.reindex_in_flight.store(false, Ordering::SeqCst);
    }

    pub fn is_reindex_in_flight(&self) -> bool {
        self.reindex_in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_once_threshold_reached() {
        let tracker = DirtyTracker::new(3, true);
        assert!(!tracker.notify("a.py"));
        assert!(!tracker.notify("b.py"));
        assert!(tracker.notify("c.py"));
        assert_eq!(tracker.dirty_count(), 3);
    }

    #[test]
    fn test_does_not_trigger_again_while_in_flight() {
        let tracker = DirtyTracker::new(1, true);
        assert!(tracker.notify("a.py"));
        assert!(!tracker.notify("b.py"));
        tracker.reindex_completed();
        assert!(tracker.notify("c.py"));
    }

    #[test]
    fn test_disabled_semantic_indexing_never_triggers() {
        let tracker = DirtyTracker::new(1, false);
        assert!(!tracker.notify("a.py"));
    }
}
