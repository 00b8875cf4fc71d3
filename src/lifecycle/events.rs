//! Shutdown triggers and fatal events.
//!
//! # Responsibilities
//! - Name the three termination signals the coordinator reacts to
//! - Carry the error behind an uncaught exception or unhandled rejection
//!
//! # Design Decisions
//! - An uncaught exception is a panic that reaches the process panic hook
//! - An unhandled rejection is an `Err` from a detached task nobody awaits
//! - Fatal errors are shared (`Arc`) so the crash hook and the logger see the same value

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::PanicHookInfo;
use std::sync::Arc;

use serde::Serialize;

use crate::lifecycle::hooks::HookError;
use crate::observability::format::safe_stringify;

/// Termination signal that starts a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownTrigger {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGQUIT.
    Quit,
}

impl ShutdownTrigger {
    /// All triggers, in registration order.
    pub const ALL: [ShutdownTrigger; 3] = [
        ShutdownTrigger::Interrupt,
        ShutdownTrigger::Terminate,
        ShutdownTrigger::Quit,
    ];

    /// Conventional signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownTrigger::Interrupt => "SIGINT",
            ShutdownTrigger::Terminate => "SIGTERM",
            ShutdownTrigger::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    pub(crate) fn signal_kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            ShutdownTrigger::Interrupt => SignalKind::interrupt(),
            ShutdownTrigger::Terminate => SignalKind::terminate(),
            ShutdownTrigger::Quit => SignalKind::quit(),
        }
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which process-level fatal condition was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    UncaughtException,
    UnhandledRejection,
}

impl FatalKind {
    /// Prefix used when the event is logged.
    pub fn label(&self) -> &'static str {
        match self {
            FatalKind::UncaughtException => "Uncaught Exception",
            FatalKind::UnhandledRejection => "Unhandled Rejection",
        }
    }
}

/// The error that escaped every handler.
#[derive(Debug)]
pub struct FatalError {
    message: String,
    stack: Option<String>,
    source: Option<HookError>,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            source: None,
        }
    }

    /// Wrap a concrete error, keeping it as the source.
    pub fn from_error<E: Into<HookError>>(error: E) -> Self {
        let source = error.into();
        Self {
            message: source.to_string(),
            stack: None,
            source: Some(source),
        }
    }

    /// Build from a rejection reason that is not an error type.
    pub fn from_reason<T: Serialize + ?Sized>(reason: &T) -> Self {
        Self::new(safe_stringify(reason))
    }

    pub(crate) fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let message = panic_message(info.payload());
        let location = info
            .location()
            .map(|l| format!("at {}", l))
            .unwrap_or_else(|| "at <unknown location>".to_string());

        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => format!("{}\n{}", location, backtrace),
            _ => location,
        };

        Self {
            message,
            stack: Some(stack),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Panic location and backtrace, when known.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// A fatal condition delivered to the crash path.
#[derive(Debug, Clone)]
pub struct FatalEvent {
    kind: FatalKind,
    error: Arc<FatalError>,
}

impl FatalEvent {
    pub fn uncaught_exception(error: FatalError) -> Self {
        Self {
            kind: FatalKind::UncaughtException,
            error: Arc::new(error),
        }
    }

    pub fn unhandled_rejection(error: FatalError) -> Self {
        Self {
            kind: FatalKind::UnhandledRejection,
            error: Arc::new(error),
        }
    }

    pub fn kind(&self) -> FatalKind {
        self.kind
    }

    pub fn error(&self) -> Arc<FatalError> {
        Arc::clone(&self.error)
    }
}

/// Render a panic payload the way `std` prints it.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
