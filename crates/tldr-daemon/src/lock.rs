//! Single-instance guarantee (C9): an OS-level exclusive advisory lock on a
//! deterministic per-project file. A second daemon for the same project
//! fails to acquire it and exits cleanly rather than racing the first.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;

pub struct SingleInstanceLock {
    file: File,
}

impl SingleInstanceLock {
    /// Attempts to acquire the lock at `path`, creating the file and its
    /// parent directory if needed. `Ok(None)` means another process already
    /// holds it — not an error, the caller's job is to exit cleanly with
    /// "already running".
    pub fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).write(true).open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn release(self) -> io::Result<()> {
        FileExt::unlock(&self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_on_same_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.lock");

        let first = SingleInstanceLock::try_acquire(&path).unwrap();
        assert!(first.is_some());

        let second = SingleInstanceLock::try_acquire(&path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_acquire_after_release_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.lock");

        let first = SingleInstanceLock::try_acquire(&path).unwrap().unwrap();
        first.release().unwrap();

        let second = SingleInstanceLock::try_acquire(&path).unwrap();
        assert!(second.is_some());
    }
}
