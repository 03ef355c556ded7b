//! Cross-platform file system change detection feeding the daemon's dirty-file
//! count (C9's reindex trigger) and the durability partitioner's
//! `filter_reindexable` pass.
//!
//! Debounces duplicate events from the underlying `notify` watcher and
//! ignores a fixed set of noisy directories by default (`node_modules`,
//! `.git`, `target`, `__pycache__`).

pub mod application;
pub mod infrastructure;
pub mod ports;

// Re-export application layer (primary interface)
pub use application::{FileWatcherUseCase, FileWatcherUseCaseImpl};

// Re-export infrastructure (internal use - prefer application layer)
#[doc(hidden)]
pub use infrastructure::FileWatcher;

pub use ports::{FileChangeEvent, FileEventHandler, WatchConfig};
