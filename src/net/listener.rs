//! Listener adapter for the shutdown coordinator.
//!
//! # Responsibilities
//! - Describe a resource that can stop accepting work ([`Closable`])
//! - Turn such a resource into a `close_server` hook
//!
//! # Design Decisions
//! - Cancellation means "stop waiting", never "kill the resource"
//! - The close runs on its own task and is left running if abandoned
//! - Timeouts belong to the task runner, not to the adapter

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::hooks::{HookError, HookResult, ShutdownHook};

/// A resource that can stop accepting new work and drain what it has.
pub trait Closable: Send + 'static {
    /// Begin closing; the future resolves once the resource is closed.
    fn close(self: Box<Self>) -> BoxFuture<'static, HookResult>;
}

/// Wrap a closable resource as a `close_server` hook.
///
/// The resource is closed at most once. Later invocations succeed immediately.
pub fn close_listener<C: Closable>(resource: C) -> ShutdownHook {
    let slot: Arc<Mutex<Option<Box<dyn Closable>>>> = Arc::new(Mutex::new(Some(Box::new(resource))));

    Arc::new(move |token: CancellationToken| {
        let resource = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        async move {
            let Some(resource) = resource else {
                tracing::debug!("Listener already closed");
                return Ok(());
            };

            let mut closing = tokio::spawn(resource.close());
            tokio::select! {
                joined = &mut closing => match joined {
                    Ok(result) => {
                        if result.is_ok() {
                            tracing::info!("Listener closed");
                        }
                        result
                    }
                    Err(e) => Err(HookError::from(format!("listener close task failed: {}", e))),
                },
                _ = token.cancelled() => {
                    tracing::warn!("Listener did not close in time; forced close");
                    Ok(())
                }
            }
        }
        .boxed()
    })
}
