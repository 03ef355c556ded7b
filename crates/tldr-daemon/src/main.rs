//! `tldrd`: starts the project daemon for the current (or given) project
//! root, or exits cleanly if one is already running for it.

use std::path::PathBuf;
use std::sync::Arc;

use tldr_core::features::workspace::WorkspaceConfig;
use tldr_daemon::{Daemon, SingleInstanceLock};

fn main() {
    tracing_subscriber::fmt::init();

    let project_root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().expect("current directory should be readable"));

    let paths = tldr_daemon::ProjectPaths::new(project_root.clone());

    let lock = match SingleInstanceLock::try_acquire(&paths.lock_path()) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            println!("tldrd is already running for {}", project_root.display());
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("failed to acquire daemon lock: {e}");
            std::process::exit(1);
        }
    };

    let workspace_config = load_workspace_config(&project_root);
    let semantic_enabled = std::env::var("TLDR_SEMANTIC").map(|v| v == "1").unwrap_or(false);

    let daemon = match Daemon::new(project_root, workspace_config, semantic_enabled) {
        Ok(daemon) => Arc::new(daemon),
        Err(e) => {
            eprintln!("failed to initialize daemon: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = tldr_daemon::server::run(daemon) {
        eprintln!("daemon exited with error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = lock.release() {
        tracing::warn!(error = %e, "failed to release daemon lock cleanly");
    }
}

/// Points the workspace config at `.tldrignore` in the project root if
/// present; `WorkspaceFilter` parses it with real gitignore syntax. An
/// absent file just means no extra excludes beyond the built-in defaults,
/// never a startup failure.
fn load_workspace_config(project_root: &std::path::Path) -> WorkspaceConfig {
    let ignore_path = project_root.join(".tldrignore");
    WorkspaceConfig::new(Vec::new(), Vec::new()).with_tldrignore_path(ignore_path)
}
