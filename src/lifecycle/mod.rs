//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT → Coordinator::run_graceful_shutdown
//!     panic hook / FatalReporter → Coordinator::run_crash_shutdown
//!
//! Shutdown (shutdown.rs):
//!     guard (state.rs) → cleanup tasks (task.rs), each with deadline + token
//!     → join → log failures → exit (exit.rs)
//! ```
//!
//! # Design Decisions
//! - One shutdown sequence per process; a second trigger forces exit code 1
//! - Every cleanup task has its own deadline
//! - Cancellation is cooperative: hooks are asked to stop, never killed

pub mod events;
pub mod exit;
pub mod hooks;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod task;

pub use events::{FatalError, FatalEvent, FatalKind, ShutdownTrigger};
pub use exit::{ExitCode, ProcessExit, StdExit};
pub use hooks::{crash_hook, shutdown_hook, CrashHook, HookError, HookResult, ShutdownConfig, ShutdownHook};
pub use shutdown::Coordinator;
pub use signals::{install, FatalReporter, RegistryError};
pub use state::LifecycleState;
pub use task::{run_with_deadline, CleanupTask, TaskError};
