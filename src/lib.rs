//! Fatal-event interception and deadline-bounded graceful shutdown.
//!
//! A [`Coordinator`] is built once at startup and bound to the process with
//! [`lifecycle::install`]. From then on:
//! - SIGINT/SIGTERM/SIGQUIT run `close_server` and `on_shutdown` concurrently,
//!   each under its own deadline, and exit with 0 or 1
//! - panics that escape every handler and errors reported through the
//!   [`FatalReporter`] are logged and, if configured, run `on_crash` and exit 1
//! - a trigger arriving mid-shutdown forces exit 1 immediately

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::AppConfig;
pub use http::{AppError, HttpServer};
pub use lifecycle::{Coordinator, FatalReporter, ShutdownConfig};
