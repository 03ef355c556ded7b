//! Daemon state machine (C9): `initializing -> ready -> (serving)* ->
//! shutting_down -> stopped`, mirrored to a status file so an external
//! process (or a second invocation) can observe it without speaking the
//! socket protocol.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Initializing,
    Ready,
    ShuttingDown,
    Stopped,
}

impl DaemonState {
    fn as_str(&self) -> &'static str {
        match self {
            DaemonState::Initializing => "initializing",
            DaemonState::Ready => "ready",
            DaemonState::ShuttingDown => "shutting_down",
            DaemonState::Stopped => "stopped",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => DaemonState::Initializing,
            1 => DaemonState::Ready,
            2 => DaemonState::ShuttingDown,
            _ => DaemonState::Stopped,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            DaemonState::Initializing => 0,
            DaemonState::Ready => 1,
            DaemonState::ShuttingDown => 2,
            DaemonState::Stopped => 3,
        }
    }
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lock-free current-state holder; `status()` is cheap enough to call from
/// the `status` command on every request without contention.
pub struct StateMachine {
    state: AtomicU8,
    status_file: std::path::PathBuf,
}

impl StateMachine {
    pub fn new(status_file: impl Into<std::path::PathBuf>) -> Self {
        Self { state: AtomicU8::new(DaemonState::Initializing.to_u8()), status_file: status_file.into() }
    }

    pub fn current(&self) -> DaemonState {
        DaemonState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn transition(&self, next: DaemonState) -> std::io::Result<()> {
        self.state.store(next.to_u8(), Ordering::SeqCst);
        if let Some(parent) = self.status_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.status_file, next.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_persists_to_status_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status");
        let sm = StateMachine::new(&path);
        assert_eq!(sm.current(), DaemonState::Initializing);

        sm.transition(DaemonState::Ready).unwrap();
        assert_eq!(sm.current(), DaemonState::Ready);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ready");
    }
}
