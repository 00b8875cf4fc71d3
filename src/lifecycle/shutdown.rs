//! Shutdown coordination for the process.
//!
//! # Responsibilities
//! - Own the idempotency guard (one shutdown sequence per process)
//! - Run `close_server` and `on_shutdown` concurrently on termination signals
//! - Run `on_crash` on fatal events when configured to exit
//! - Log every failure and pick the exit code
//!
//! # Design Decisions
//! - Both graceful cleanup tasks are always attempted; no short-circuit on failure
//! - A trigger that arrives while shutting down forces exit code 1 immediately
//! - Process exit is the last action on every path

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::http::error::AppError;
use crate::lifecycle::events::{FatalEvent, ShutdownTrigger};
use crate::lifecycle::exit::{ExitCode, ProcessExit, StdExit};
use crate::lifecycle::hooks::{ShutdownConfig, ShutdownHook};
use crate::lifecycle::state::{LifecycleState, StateCell};
use crate::lifecycle::task::{run_with_deadline, TaskError};
use crate::observability::logging::{log_error, log_task_failure};

/// Coordinator for graceful and crash shutdown.
///
/// Constructed once at startup and shared (via `Arc`) with the signal registry.
pub struct Coordinator {
    config: ArcSwap<ShutdownConfig>,
    state: StateCell,
    exit: Arc<dyn ProcessExit>,
}

impl Coordinator {
    /// Create a coordinator that terminates the real process.
    pub fn new(config: ShutdownConfig) -> Self {
        Self::with_exit(config, Arc::new(StdExit))
    }

    /// Create a coordinator with a custom exit effect.
    pub fn with_exit(config: ShutdownConfig, exit: Arc<dyn ProcessExit>) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            state: StateCell::new(),
            exit,
        }
    }

    /// Replace the whole configuration. Fields are not merged.
    pub fn configure(&self, config: ShutdownConfig) {
        tracing::info!(
            max_timeout = ?config.max_timeout,
            exit_on_unhandled_rejection = config.exit_on_unhandled_rejection,
            exit_on_uncaught_exception = config.exit_on_uncaught_exception,
            "Shutdown configuration replaced"
        );
        self.config.store(Arc::new(config));
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> Arc<ShutdownConfig> {
        self.config.load_full()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Handle a termination signal.
    pub async fn run_graceful_shutdown(&self, trigger: ShutdownTrigger) {
        if !self.state.try_begin_shutdown() {
            self.force_exit(trigger.as_str());
            return;
        }

        let config = self.config.load_full();
        tracing::info!(
            signal = %trigger,
            max_timeout = ?config.max_timeout,
            "Graceful shutdown started"
        );

        let (closed, finished) = tokio::join!(
            run_optional("close_server", config.max_timeout, config.close_server.clone()),
            run_optional("on_shutdown", config.max_timeout, config.on_shutdown.clone()),
        );

        let failures: Vec<TaskError> = [closed, finished]
            .into_iter()
            .filter_map(Result::err)
            .collect();

        let code = if failures.is_empty() {
            ExitCode::Success
        } else {
            tracing::error!(failed = failures.len(), "Graceful shutdown finished with failures");
            for failure in failures {
                log_task_failure(failure);
            }
            ExitCode::Failure
        };

        self.terminate(code);
    }

    /// Handle an uncaught exception or unhandled rejection.
    pub async fn run_crash_shutdown(&self, event: FatalEvent) {
        log_error(&AppError::from(&event), None);

        let config = self.config.load_full();
        if !config.exits_on(event.kind()) {
            tracing::warn!(
                kind = event.kind().label(),
                "Fatal event reported; process kept alive by configuration"
            );
            return;
        }

        if !self.state.try_begin_shutdown() {
            self.force_exit(event.kind().label());
            return;
        }

        tracing::info!(
            kind = event.kind().label(),
            max_timeout = ?config.max_timeout,
            "Crash shutdown started"
        );

        if let Some(hook) = config.on_crash.clone() {
            let error = event.error();
            let outcome =
                run_with_deadline("on_crash", config.max_timeout, move |token| hook(error, token)).await;
            if let Err(failure) = outcome {
                log_task_failure(failure);
            }
        }

        self.terminate(ExitCode::Failure);
    }

    fn force_exit(&self, cause: &str) {
        let previous = self.state.mark_terminated();
        if previous == LifecycleState::Terminated {
            tracing::debug!(trigger = cause, "Exit already requested");
            return;
        }
        tracing::warn!(
            trigger = cause,
            state = ?previous,
            "Shutdown already in progress; forcing exit"
        );
        self.exit.exit(ExitCode::Failure);
    }

    fn terminate(&self, code: ExitCode) {
        if self.state.mark_terminated() == LifecycleState::Terminated {
            tracing::debug!(exit_code = code.code(), "Exit already forced");
            return;
        }
        tracing::info!(exit_code = code.code(), "Shutdown complete");
        self.exit.exit(code);
    }
}

async fn run_optional(
    name: &'static str,
    deadline: Duration,
    hook: Option<ShutdownHook>,
) -> Result<(), TaskError> {
    match hook {
        Some(hook) => run_with_deadline(name, deadline, move |token| hook(token)).await,
        None => {
            tracing::debug!(task = name, "No hook configured");
            Ok(())
        }
    }
}
