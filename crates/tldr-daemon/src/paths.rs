//! Deterministic per-project paths (C9): every file the daemon needs to find
//! again after a restart, or that a second invocation needs to find to
//! detect the first one, is derived from the project's absolute path so no
//! separate registry of "which daemon owns which project" is needed.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

/// First 8 hex characters of the MD5 digest of the project's absolute path.
/// Collisions are possible but inconsequential: a collision just means two
/// unrelated projects would contend for the same lock, which fails safe
/// (the second one refuses to start) rather than corrupting anything.
pub fn project_hash(project_root: &Path) -> String {
    let absolute = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let mut hasher = Md5::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// `49152 + (int(hash8, 16) % 10000)`, the Windows TCP port formula from the
/// cross-platform listen scenario.
pub fn ephemeral_port(hash8: &str) -> u16 {
    let value = u32::from_str_radix(hash8, 16).unwrap_or(0);
    49152 + (value % 10000) as u16
}

pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub hash: String,
    tmp_dir: PathBuf,
    project_state_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let hash = project_hash(&project_root);
        let tmp_dir = std::env::temp_dir().join("tldr");
        let project_state_dir = project_root.join(".tldr");
        Self { project_root, hash, tmp_dir, project_state_dir }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    /// `<project>/.tldr`, where persisted caches, the PID file, and the
    /// status file live.
    pub fn state_dir(&self) -> &Path {
        &self.project_state_dir
    }

    /// The advisory lock file's deterministic path, namespaced under the
    /// per-user tmp directory rather than inside the project itself, so a
    /// project directory that's deleted and recreated doesn't resurrect a
    /// stale lock.
    pub fn lock_path(&self) -> PathBuf {
        self.tmp_dir.join(format!("tldr-{}.lock", self.hash))
    }

    /// `<tmp>/tldr-<hash8>.sock` on POSIX, per the cross-platform listen
    /// scenario.
    pub fn socket_path(&self) -> PathBuf {
        self.tmp_dir.join(format!("tldr-{}.sock", self.hash))
    }

    pub fn tcp_port(&self) -> u16 {
        ephemeral_port(&self.hash)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.project_state_dir.join("daemon.pid")
    }

    pub fn status_file(&self) -> PathBuf {
        self.project_state_dir.join("status")
    }

    pub fn call_graph_cache_file(&self) -> PathBuf {
        self.project_state_dir.join("cache").join("call_graph.json")
    }

    pub fn semantic_metadata_file(&self) -> PathBuf {
        self.project_state_dir.join("cache").join("semantic").join("metadata.json")
    }

    pub fn content_hash_index_file(&self) -> PathBuf {
        self.project_state_dir.join("cache").join("content_hashes.json")
    }

    pub fn durable_partitions_dir(&self) -> PathBuf {
        self.project_state_dir.join("durable")
    }

    pub fn volatile_partition_file(&self) -> PathBuf {
        self.project_state_dir.join("volatile.json")
    }
}

/// `pkg` encoded by `/` -> `__`, `@` -> `_at_`, as the manifest for durable
/// partition files requires.
pub fn encode_package_key(package_key: &str) -> String {
    package_key.replace('@', "_at_").replace('/', "__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_hash_is_deterministic_and_8_hex_chars() {
        let a = project_hash(Path::new("/tmp/does-not-exist-project-a"));
        let b = project_hash(Path::new("/tmp/does-not-exist-project-a"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_projects_hash_differently() {
        let a = project_hash(Path::new("/tmp/project-a"));
        let b = project_hash(Path::new("/tmp/project-b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_ephemeral_port_within_expected_range() {
        let port = ephemeral_port("00000000");
        assert_eq!(port, 49152);
        let port = ephemeral_port("ffffffff");
        assert!((49152..59152).contains(&port));
    }

    #[test]
    fn test_encode_package_key_replaces_scope_and_slash() {
        assert_eq!(encode_package_key("@types/react"), "_at_types__react");
        assert_eq!(encode_package_key("github.com/pkg/errors"), "github.com__pkg__errors");
    }
}
