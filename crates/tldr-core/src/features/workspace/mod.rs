//! Workspace & Ignore Filter (C10): decides whether a path is in scope for
//! indexing, ahead of every other pipeline stage.
//!
//! Two independent checks gate a path: it must be rooted under one of the
//! configured active packages (or no restriction is configured at all), and
//! it must not match any exclude pattern — the built-in defaults plus
//! whatever the project's `.tldrignore` adds.

use std::path::PathBuf;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::shared::models::error::{CoreError, Result};

const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/target/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "**/venv/**",
    "**/dist/**",
    "**/build/**",
];

const TLDRIGNORE_TEMPLATE: &str = "# Default ignore patterns for tldr indexing.\n\
node_modules/\n.git/\ntarget/\n__pycache__/\n.venv/\nvenv/\ndist/\nbuild/\n";

/// Normalizes a path the way every comparison in this module expects:
/// backslashes to forward slashes, a leading `./` stripped, a trailing `/`
/// stripped.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    if let Some(stripped) = normalized.strip_prefix("./") {
        normalized = stripped.to_string();
    }
    if normalized.len() > 1 {
        normalized = normalized.trim_end_matches('/').to_string();
    }
    normalized
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub active_packages: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Path to a `.tldrignore` file, parsed with real gitignore syntax
    /// (anchoring, negation, directory-only patterns) rather than folded
    /// into `exclude_patterns`' flat globs.
    pub tldrignore_path: Option<PathBuf>,
}

impl WorkspaceConfig {
    pub fn new(active_packages: Vec<String>, exclude_patterns: Vec<String>) -> Self {
        Self { active_packages, exclude_patterns, tldrignore_path: None }
    }

    pub fn with_tldrignore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tldrignore_path = Some(path.into());
        self
    }
}

pub struct WorkspaceFilter {
    active_packages: Vec<String>,
    excludes: GlobSet,
    tldrignore: Option<Gitignore>,
}

impl WorkspaceFilter {
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).chain(config.exclude_patterns.iter().cloned()) {
            let glob = Glob::new(&pattern)
                .map_err(|e| CoreError::invalid_request(format!("invalid ignore pattern {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| CoreError::internal(format!("failed to build ignore glob set: {e}")))?;

        let tldrignore = match &config.tldrignore_path {
            Some(path) if path.is_file() => {
                let root = path.parent().unwrap_or_else(|| std::path::Path::new("."));
                let mut gi_builder = GitignoreBuilder::new(root);
                if let Some(err) = gi_builder.add(path) {
                    return Err(CoreError::invalid_request(format!(
                        "invalid .tldrignore at {}: {err}",
                        path.display()
                    )));
                }
                let gi = gi_builder
                    .build()
                    .map_err(|e| CoreError::invalid_request(format!("invalid .tldrignore at {}: {e}", path.display())))?;
                Some(gi)
            }
            _ => None,
        };

        Ok(Self {
            active_packages: config.active_packages.clone(),
            excludes,
            tldrignore,
        })
    }

    /// True iff `path` is rooted under an active package (or none are
    /// configured), matches no built-in/custom exclude glob, and isn't
    /// ignored by the project's `.tldrignore`.
    pub fn is_included(&self, path: &str) -> bool {
        let normalized = normalize_path(path);

        let in_active_package = self.active_packages.is_empty()
            || self.active_packages.iter().any(|pkg| {
                let pkg = normalize_path(pkg);
                normalized == pkg || normalized.starts_with(&format!("{pkg}/"))
            });
        if !in_active_package {
            return false;
        }

        if self.excludes.is_match(&normalized) {
            return false;
        }

        if let Some(tldrignore) = &self.tldrignore {
            if tldrignore.matched(&normalized, false).is_ignore() {
                return false;
            }
        }

        true
    }
}

/// The documented default `.tldrignore` template written the first time a
/// project is indexed and no such file exists yet. Absence of this file is
/// advisory only — indexing proceeds either way.
pub fn default_tldrignore_template() -> &'static str {
    TLDRIGNORE_TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(active: &[&str], excludes: &[&str]) -> WorkspaceFilter {
        WorkspaceFilter::new(&WorkspaceConfig::new(
            active.iter().map(|s| s.to_string()).collect(),
            excludes.iter().map(|s| s.to_string()).collect(),
        ))
        .unwrap()
    }

    #[test]
    fn test_default_excludes_cover_node_modules() {
        let f = filter(&[], &[]);
        assert!(!f.is_included("project/node_modules/lodash/index.js"));
        assert!(f.is_included("project/src/main.rs"));
    }

    #[test]
    fn test_empty_active_packages_includes_everything_not_excluded() {
        let f = filter(&[], &[]);
        assert!(f.is_included("anywhere/file.py"));
    }

    #[test]
    fn test_active_packages_restrict_to_subtree() {
        let f = filter(&["packages/core"], &[]);
        assert!(f.is_included("packages/core/src/lib.rs"));
        assert!(!f.is_included("packages/other/src/lib.rs"));
    }

    #[test]
    fn test_tldrignore_uses_real_gitignore_syntax() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".tldrignore"), "*.log\n/only_root.txt\n!keep.log\n").unwrap();
        let config = WorkspaceConfig::new(Vec::new(), Vec::new()).with_tldrignore_path(dir.path().join(".tldrignore"));
        let f = WorkspaceFilter::new(&config).unwrap();

        assert!(!f.is_included("app.log"), "a bare file glob should match the file directly, not a directory of that name");
        assert!(f.is_included("keep.log"), "a later negated pattern should un-ignore a specific file");
        assert!(!f.is_included("only_root.txt"), "a rooted pattern should match at the project root");
        assert!(f.is_included("nested/only_root.txt"), "a rooted pattern must not match the same name nested deeper");
    }

    #[test]
    fn test_missing_tldrignore_path_is_not_an_error() {
        let config = WorkspaceConfig::new(Vec::new(), Vec::new()).with_tldrignore_path("/does/not/exist/.tldrignore");
        let f = WorkspaceFilter::new(&config).unwrap();
        assert!(f.is_included("src/main.rs"));
    }

    #[test]
    fn test_normalize_path_strips_leading_dot_slash_and_backslashes() {
        assert_eq!(normalize_path("./src\\main.rs"), "src/main.rs");
        assert_eq!(normalize_path("src/main.rs/"), "src/main.rs");
    }

    #[test]
    fn test_custom_exclude_pattern_matches_whole_segment() {
        let f = filter(&[], &["**/fixtures/**"]);
        assert!(!f.is_included("tests/fixtures/data.json"));
        assert!(f.is_included("tests/fixtures_extra/data.json"));
    }
}
