//! The project daemon (C9): a long-lived process per project root that keeps
//! every index structure warm in memory and serves queries over a local
//! socket instead of re-parsing the whole project on every CLI invocation.

pub mod dirty;
pub mod kernel;
pub mod lock;
pub mod paths;
pub mod protocol;
pub mod server;
pub mod state;

pub use kernel::{Daemon, DaemonFileEventHandler};
pub use lock::SingleInstanceLock;
pub use paths::ProjectPaths;
pub use state::{DaemonState, StateMachine};
