//! Cleanup hooks and the runtime shutdown configuration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::config::ShutdownSettings;
use crate::lifecycle::events::{FatalError, FatalKind};
use crate::net::listener::{close_listener, Closable};

/// Error returned by a user hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a user hook.
pub type HookResult = Result<(), HookError>;

/// Hook run on the graceful path (`close_server`, `on_shutdown`).
pub type ShutdownHook = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, HookResult> + Send + Sync>;

/// Hook run on the crash path.
pub type CrashHook =
    Arc<dyn Fn(Arc<FatalError>, CancellationToken) -> BoxFuture<'static, HookResult> + Send + Sync>;

/// Box a closure into a [`ShutdownHook`].
pub fn shutdown_hook<F, Fut>(f: F) -> ShutdownHook
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    Arc::new(move |token| f(token).boxed())
}

/// Box a closure into a [`CrashHook`].
pub fn crash_hook<F, Fut>(f: F) -> CrashHook
where
    F: Fn(Arc<FatalError>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    Arc::new(move |error, token| f(error, token).boxed())
}

/// Everything the coordinator needs to drive a shutdown.
///
/// Missing hooks are treated as cleanup steps that succeed immediately.
#[derive(Clone)]
pub struct ShutdownConfig {
    /// Exit when a detached task fails and nobody observes the error.
    pub exit_on_unhandled_rejection: bool,
    /// Exit when a panic reaches the process panic hook.
    pub exit_on_uncaught_exception: bool,
    /// Deadline applied to each cleanup task independently.
    pub max_timeout: Duration,
    pub on_crash: Option<CrashHook>,
    pub on_shutdown: Option<ShutdownHook>,
    pub close_server: Option<ShutdownHook>,
}

impl ShutdownConfig {
    pub fn from_settings(settings: &ShutdownSettings) -> Self {
        Self {
            exit_on_unhandled_rejection: settings.exit_on_unhandled_rejection,
            exit_on_uncaught_exception: settings.exit_on_uncaught_exception,
            max_timeout: settings.max_timeout(),
            ..Self::default()
        }
    }

    pub fn with_max_timeout(mut self, max_timeout: Duration) -> Self {
        self.max_timeout = max_timeout;
        self
    }

    pub fn with_exit_on_unhandled_rejection(mut self, exit: bool) -> Self {
        self.exit_on_unhandled_rejection = exit;
        self
    }

    pub fn with_exit_on_uncaught_exception(mut self, exit: bool) -> Self {
        self.exit_on_uncaught_exception = exit;
        self
    }

    pub fn with_on_crash<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<FatalError>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_crash = Some(crash_hook(f));
        self
    }

    pub fn with_on_shutdown<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_shutdown = Some(shutdown_hook(f));
        self
    }

    pub fn with_close_server<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.close_server = Some(shutdown_hook(f));
        self
    }

    /// Use a closable resource (e.g. a running server) as the `close_server` hook.
    pub fn with_listener<C: Closable>(mut self, resource: C) -> Self {
        self.close_server = Some(close_listener(resource));
        self
    }

    /// Whether a fatal event of this kind terminates the process.
    pub fn exits_on(&self, kind: FatalKind) -> bool {
        match kind {
            FatalKind::UncaughtException => self.exit_on_uncaught_exception,
            FatalKind::UnhandledRejection => self.exit_on_unhandled_rejection,
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            exit_on_unhandled_rejection: true,
            exit_on_uncaught_exception: true,
            max_timeout: Duration::from_secs(10),
            on_crash: None,
            on_shutdown: None,
            close_server: None,
        }
    }
}

impl fmt::Debug for ShutdownConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownConfig")
            .field("exit_on_unhandled_rejection", &self.exit_on_unhandled_rejection)
            .field("exit_on_uncaught_exception", &self.exit_on_uncaught_exception)
            .field("max_timeout", &self.max_timeout)
            .field("on_crash", &self.on_crash.is_some())
            .field("on_shutdown", &self.on_shutdown.is_some())
            .field("close_server", &self.close_server.is_some())
            .finish()
    }
}
