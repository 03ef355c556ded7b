//! Application layer - orchestrates the infrastructure watcher behind a
//! small use-case trait.

mod watcher_usecase;

pub use watcher_usecase::{FileWatcherUseCase, FileWatcherUseCaseImpl};
