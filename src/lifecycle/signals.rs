//! OS signal and fatal event handling.
//!
//! # Responsibilities
//! - Register SIGINT/SIGTERM/SIGQUIT handlers (Ctrl+C elsewhere)
//! - Install a panic hook that reports uncaught exceptions
//! - Hand out a [`FatalReporter`] for unhandled rejections
//! - Dispatch every trigger to the [`Coordinator`]
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Each occurrence is dispatched on its own task, so a second signal reaches
//!   the coordinator while the first shutdown is still running (forced exit)
//! - Installation happens at most once per process

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::events::{FatalError, FatalEvent, ShutdownTrigger};
use crate::lifecycle::hooks::HookError;
use crate::lifecycle::shutdown::Coordinator;
use crate::lifecycle::task::current_cleanup_task;
use crate::observability::logging::is_rendering;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Error type for registry installation.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("shutdown handlers are already installed for this process")]
    AlreadyInstalled,

    #[error("shutdown handlers must be installed from inside a Tokio runtime")]
    NoRuntime,

    #[error("failed to register {signal} handler: {source}")]
    Signal {
        signal: ShutdownTrigger,
        #[source]
        source: std::io::Error,
    },
}

/// Sends fatal events to the crash path.
#[derive(Debug, Clone)]
pub struct FatalReporter {
    tx: mpsc::UnboundedSender<FatalEvent>,
}

impl FatalReporter {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<FatalEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A reporter feeding `coordinator`'s crash path, without binding any
    /// process-wide trigger. Must be called inside a Tokio runtime.
    pub fn attach(coordinator: Arc<Coordinator>) -> Self {
        let (reporter, events) = Self::channel();
        dispatch_fatal_events(coordinator, events);
        reporter
    }

    /// Report an error nobody is going to observe.
    pub fn unhandled_rejection<E: Into<HookError>>(&self, error: E) {
        self.report(FatalEvent::unhandled_rejection(FatalError::from_error(error)));
    }

    /// Report an exception that escaped every handler.
    pub fn uncaught_exception(&self, error: FatalError) {
        self.report(FatalEvent::uncaught_exception(error));
    }

    /// Spawn a detached task whose error, if any, is reported as an unhandled rejection.
    pub fn spawn<F, T, E>(&self, future: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<HookError> + Send + 'static,
    {
        let reporter = self.clone();
        tokio::spawn(async move {
            match future.await {
                Ok(value) => Some(value),
                Err(error) => {
                    reporter.unhandled_rejection(error);
                    None
                }
            }
        })
    }

    pub fn report(&self, event: FatalEvent) {
        if self.tx.send(event).is_err() {
            tracing::error!("Fatal event dropped: dispatcher is not running");
        }
    }
}

/// Bind every shutdown trigger to `coordinator`.
///
/// Must be called inside a Tokio runtime, otherwise
/// [`RegistryError::NoRuntime`] is returned and nothing is installed.
/// Returns [`RegistryError::AlreadyInstalled`] on any call after the first
/// successful one.
pub fn install(coordinator: Arc<Coordinator>) -> Result<FatalReporter, RegistryError> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(RegistryError::NoRuntime);
    }
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Err(RegistryError::AlreadyInstalled);
    }

    let installed = bind(coordinator);
    if installed.is_err() {
        INSTALLED.store(false, Ordering::SeqCst);
    }
    installed
}

fn bind(coordinator: Arc<Coordinator>) -> Result<FatalReporter, RegistryError> {
    listen_for_signals(Arc::clone(&coordinator))?;

    let reporter = FatalReporter::attach(coordinator);
    install_panic_hook(reporter.clone());

    tracing::info!("Shutdown handlers installed");
    Ok(reporter)
}

#[cfg(unix)]
fn listen_for_signals(coordinator: Arc<Coordinator>) -> Result<(), RegistryError> {
    use tokio::signal::unix::signal;

    // Register everything before spawning so a failure leaves nothing behind.
    let mut streams = Vec::with_capacity(ShutdownTrigger::ALL.len());
    for trigger in ShutdownTrigger::ALL {
        let stream = signal(trigger.signal_kind())
            .map_err(|source| RegistryError::Signal { signal: trigger, source })?;
        streams.push((trigger, stream));
    }

    for (trigger, mut stream) in streams {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                tracing::info!(signal = %trigger, "Received shutdown signal");
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.run_graceful_shutdown(trigger).await });
            }
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn listen_for_signals(coordinator: Arc<Coordinator>) -> Result<(), RegistryError> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received Ctrl+C");
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .run_graceful_shutdown(ShutdownTrigger::Interrupt)
                    .await
            });
        }
    });
    Ok(())
}

pub(crate) fn dispatch_fatal_events(
    coordinator: Arc<Coordinator>,
    mut events: mpsc::UnboundedReceiver<FatalEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run_crash_shutdown(event).await });
        }
    })
}

fn install_panic_hook(reporter: FatalReporter) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        // Panics inside cleanup hooks surface as task failures instead, and
        // the logger contains its own rendering panics.
        if current_cleanup_task().is_some() || is_rendering() {
            return;
        }
        reporter.uncaught_exception(FatalError::from_panic(info));
    }));
}
