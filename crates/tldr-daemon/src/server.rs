//! The synchronous accept loop (C9). No async runtime is in the dependency
//! graph, so connections are served one OS thread per connection, same as
//! the teacher's worker-pool idiom elsewhere in this workspace just without
//! a pool — a project daemon serves a handful of concurrent CLI/editor
//! clients, not thousands.

use std::io::{BufReader, BufWriter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tldr_core::features::file_watcher::{FileWatcher, WatchConfig};

use crate::kernel::{Daemon, DaemonFileEventHandler};
use crate::protocol::{invalid_json_response, read_request, write_response};

const IDLE_TIMEOUT_SECS: u64 = 30 * 60;
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

pub fn run(daemon: Arc<Daemon>) -> std::io::Result<()> {
    daemon.mark_ready()?;
    let last_activity = Arc::new(AtomicU64::new(now_secs()));

    spawn_idle_watchdog(daemon.clone(), last_activity.clone());
    let _watcher = start_file_watcher(daemon.clone());

    #[cfg(unix)]
    {
        run_unix(daemon.clone(), last_activity)?;
    }
    #[cfg(windows)]
    {
        run_tcp(daemon.clone(), last_activity)?;
    }

    daemon.persist_and_stop()?;
    Ok(())
}

fn spawn_idle_watchdog(daemon: Arc<Daemon>, last_activity: Arc<AtomicU64>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(IDLE_CHECK_INTERVAL);
        if daemon.is_shutting_down() {
            break;
        }
        let idle_for = now_secs().saturating_sub(last_activity.load(Ordering::SeqCst));
        if idle_for >= IDLE_TIMEOUT_SECS {
            tracing::info!(idle_for, "idle timeout reached, shutting down");
            daemon.request_shutdown();
            wake_acceptor(&daemon);
            break;
        }
    });
}

/// Starts the OS-level watcher over the project root so the daemon notices
/// file changes on its own, not only through a client-sent `notify` command.
/// A watcher that fails to start (root missing, platform limits) just means
/// the daemon stays reactive-only, never a startup failure.
fn start_file_watcher(daemon: Arc<Daemon>) -> Option<FileWatcher> {
    use tldr_core::shared::ports::language::Language;
    const ALL_LANGUAGES: &[Language] = &[
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Ruby,
        Language::Php,
        Language::Swift,
        Language::Kotlin,
        Language::Scala,
        Language::Lua,
        Language::Luau,
    ];
    let extensions: Vec<String> =
        ALL_LANGUAGES.iter().flat_map(|l| l.extensions()).map(|e| e.to_string()).collect();
    let config = WatchConfig {
        root_path: daemon.project_root().to_path_buf(),
        extensions,
        ..WatchConfig::default()
    };
    let handler = Arc::new(Mutex::new(DaemonFileEventHandler::new(daemon)));
    let mut watcher = match FileWatcher::new(config, handler) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(error = %e, "file watcher unavailable, falling back to explicit notify");
            return None;
        }
    };
    if let Err(e) = watcher.start() {
        tracing::warn!(error = %e, "failed to start file watcher");
        return None;
    }
    Some(watcher)
}

/// Opens and immediately drops a connection to our own listener so a
/// blocking `accept()` call notices the shutdown flag instead of waiting
/// for the next real client.
fn wake_acceptor(daemon: &Daemon) {
    #[cfg(unix)]
    {
        let _ = std::os::unix::net::UnixStream::connect(daemon.paths().socket_path());
    }
    #[cfg(windows)]
    {
        let _ = std::net::TcpStream::connect(("127.0.0.1", daemon.paths().tcp_port()));
    }
}

#[cfg(unix)]
fn run_unix(daemon: Arc<Daemon>, last_activity: Arc<AtomicU64>) -> std::io::Result<()> {
    use std::os::unix::net::{UnixListener, UnixStream};

    let socket_path = daemon.paths().socket_path();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(&socket_path)?;
    tracing::info!(path = %socket_path.display(), "listening");

    for stream in listener.incoming() {
        if daemon.is_shutting_down() {
            break;
        }
        match stream {
            Ok(stream) => {
                let daemon = daemon.clone();
                let last_activity = last_activity.clone();
                std::thread::spawn(move || handle_unix_connection(&daemon, stream, &last_activity));
            }
            Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
        }
    }

    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

#[cfg(unix)]
fn handle_unix_connection(daemon: &Daemon, stream: std::os::unix::net::UnixStream, last_activity: &AtomicU64) {
    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to clone connection");
            return;
        }
    };
    let mut reader = BufReader::new(reader_stream);
    let mut writer = BufWriter::new(stream);

    loop {
        match read_request(&mut reader) {
            Ok(Some(Ok(request))) => {
                last_activity.store(now_secs(), Ordering::SeqCst);
                let response = daemon.dispatch(&request);
                if write_response(&mut writer, &response).is_err() {
                    break;
                }
                if daemon.is_shutting_down() {
                    break;
                }
            }
            Ok(Some(Err(message))) => {
                if write_response(&mut writer, &invalid_json_response(&message)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "connection read error");
                break;
            }
        }
    }
}

#[cfg(windows)]
fn run_tcp(daemon: Arc<Daemon>, last_activity: Arc<AtomicU64>) -> std::io::Result<()> {
    use std::net::TcpListener;

    let port = daemon.paths().tcp_port();
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    tracing::info!(port, "listening");

    for stream in listener.incoming() {
        if daemon.is_shutting_down() {
            break;
        }
        match stream {
            Ok(stream) => {
                let daemon = daemon.clone();
                let last_activity = last_activity.clone();
                std::thread::spawn(move || handle_tcp_connection(&daemon, stream, &last_activity));
            }
            Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn handle_tcp_connection(daemon: &Daemon, stream: std::net::TcpStream, last_activity: &AtomicU64) {
    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to clone connection");
            return;
        }
    };
    let mut reader = BufReader::new(reader_stream);
    let mut writer = BufWriter::new(stream);

    loop {
        match read_request(&mut reader) {
            Ok(Some(Ok(request))) => {
                last_activity.store(now_secs(), Ordering::SeqCst);
                let response = daemon.dispatch(&request);
                if write_response(&mut writer, &response).is_err() {
                    break;
                }
                if daemon.is_shutting_down() {
                    break;
                }
            }
            Ok(Some(Err(message))) => {
                if write_response(&mut writer, &invalid_json_response(&message)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "connection read error");
                break;
            }
        }
    }
}
