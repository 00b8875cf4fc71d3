//! Deadline-bounded cleanup tasks.
//!
//! # Responsibilities
//! - Run one cleanup hook with its own cancellation token
//! - Race the hook against a fixed deadline
//! - Cancel the token when the deadline wins
//!
//! # Design Decisions
//! - The hook runs on its own Tokio task, so a timed-out hook keeps running
//!   detached instead of being dropped mid-flight; cancellation is advisory
//! - Timeout errors are distinct from hook failures
//! - Single attempt, never retried

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::events::panic_message;
use crate::lifecycle::hooks::{HookError, HookResult};

tokio::task_local! {
    static CLEANUP_TASK: &'static str;
}

/// Name of the cleanup task the current code runs in, if any.
///
/// Used by the panic hook so that a panicking cleanup hook is reported as a
/// task failure rather than as an uncaught exception.
pub fn current_cleanup_task() -> Option<&'static str> {
    CLEANUP_TASK.try_with(|name| *name).ok()
}

/// Why a cleanup task did not succeed.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{name} timed out after {after:?}")]
    Timeout { name: &'static str, after: Duration },

    #[error("{name} failed: {source}")]
    Failed {
        name: &'static str,
        #[source]
        source: HookError,
    },

    #[error("{name} panicked: {message}")]
    Panicked { name: &'static str, message: String },
}

impl TaskError {
    pub fn task_name(&self) -> &'static str {
        match self {
            TaskError::Timeout { name, .. }
            | TaskError::Failed { name, .. }
            | TaskError::Panicked { name, .. } => name,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

/// One cleanup unit: a name, a deadline, and a fresh cancellation token.
#[derive(Debug)]
pub struct CleanupTask {
    name: &'static str,
    deadline: Duration,
    token: CancellationToken,
}

impl CleanupTask {
    pub fn new(name: &'static str, deadline: Duration) -> Self {
        Self {
            name,
            deadline,
            token: CancellationToken::new(),
        }
    }

    /// A handle to the token the hook will receive.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `hook` once, bounded by the deadline.
    pub async fn run<F, Fut>(self, hook: F) -> Result<(), TaskError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let name = self.name;
        let work = CLEANUP_TASK.scope(name, hook(self.token.clone()));
        let mut handle = tokio::spawn(work);

        tokio::select! {
            biased;

            joined = &mut handle => {
                match joined {
                    Ok(Ok(())) => {
                        tracing::debug!(task = name, "Cleanup task finished");
                        Ok(())
                    }
                    Ok(Err(source)) => Err(TaskError::Failed { name, source }),
                    Err(e) if e.is_panic() => Err(TaskError::Panicked {
                        name,
                        message: panic_message(&*e.into_panic()),
                    }),
                    Err(_) => Err(TaskError::Panicked {
                        name,
                        message: "task was aborted".to_string(),
                    }),
                }
            }
            _ = tokio::time::sleep(self.deadline) => {
                self.token.cancel();
                tracing::warn!(
                    task = name,
                    deadline = ?self.deadline,
                    "Cleanup task exceeded its deadline; cancellation signalled"
                );
                // The hook keeps running detached; it is expected to observe the token.
                drop(handle);
                Err(TaskError::Timeout { name, after: self.deadline })
            }
        }
    }
}

/// Run `hook` as a fresh [`CleanupTask`].
pub async fn run_with_deadline<F, Fut>(
    name: &'static str,
    deadline: Duration,
    hook: F,
) -> Result<(), TaskError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    CleanupTask::new(name, deadline).run(hook).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    const DEADLINE: Duration = Duration::from_secs(10);

    fn explode() -> HookResult {
        panic!("hook blew up")
    }

    #[tokio::test(start_paused = true)]
    async fn success_propagates_without_cancelling() {
        let task = CleanupTask::new("ok", DEADLINE);
        let token = task.token();

        let result = task
            .run(|_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(())
            })
            .await;

        assert!(result.is_ok());
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_propagates_as_is() {
        let result = run_with_deadline("db", DEADLINE, |_| async { Err(HookError::from("port stuck")) }).await;

        match result {
            Err(TaskError::Failed { name, source }) => {
                assert_eq!(name, "db");
                assert_eq!(source.to_string(), "port stuck");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panic_is_a_task_failure() {
        let result = run_with_deadline("explodes", DEADLINE, |_| async { explode() }).await;

        match result {
            Err(TaskError::Panicked { name, message }) => {
                assert_eq!(name, "explodes");
                assert_eq!(message, "hook blew up");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_token() {
        let task = CleanupTask::new("hang", DEADLINE);
        let token = task.token();
        let start = Instant::now();

        let result = task.run(|_| std::future::pending::<HookResult>()).await;

        assert!(matches!(result, Err(TaskError::Timeout { name: "hang", .. })));
        assert!(token.is_cancelled());
        assert!(start.elapsed() >= DEADLINE);
        assert!(start.elapsed() < DEADLINE + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_hook_keeps_running_and_sees_cancellation() {
        let observed = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&observed);

        let result = run_with_deadline("cooperative", Duration::from_secs(1), move |token| async move {
            token.cancelled().await;
            seen.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(result.as_ref().is_err_and(TaskError::is_timeout));

        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn scope_is_visible_inside_hook_only() {
        assert_eq!(current_cleanup_task(), None);

        let result = run_with_deadline("scoped", DEADLINE, |_| async {
            if current_cleanup_task() == Some("scoped") {
                Ok(())
            } else {
                Err(HookError::from("scope missing"))
            }
        })
        .await;

        assert!(result.is_ok());
    }

    #[test]
    fn error_accessors() {
        let err = TaskError::Timeout {
            name: "close_server",
            after: DEADLINE,
        };
        assert_eq!(err.task_name(), "close_server");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "close_server timed out after 10s");
    }
}
