//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator, server, registry
//!     → logging.rs (structured events via tracing)
//!     → format.rs (JSON rendering of non-error values)
//!
//! Consumers:
//!     → stdout (fmt layer), filtered by RUST_LOG or config
//! ```
//!
//! # Design Decisions
//! - Operators see failures only through logs and the exit code
//! - A failing log call never interrupts shutdown

pub mod format;
pub mod logging;

pub use logging::{init_logging, log_error, log_task_failure, log_warning, RequestInfo};
