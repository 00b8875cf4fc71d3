//! HTTP-style application errors.
//!
//! An [`AppError`] carries a status code and whether the failure is
//! operational (expected, e.g. bad input) or a programmer error. Fatal events
//! and failed cleanup tasks are converted into non-operational 500s before
//! they are logged.

use axum::http::StatusCode;
use thiserror::Error;

use crate::lifecycle::events::{FatalEvent, FatalKind};
use crate::lifecycle::hooks::HookError;
use crate::lifecycle::task::TaskError;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    name: &'static str,
    message: String,
    status: StatusCode,
    operational: bool,
    stack: Option<String>,
    #[source]
    source: Option<HookError>,
}

impl AppError {
    pub fn new(message: impl Into<String>, status: StatusCode, operational: bool) -> Self {
        Self {
            name: "AppError",
            message: message.into(),
            status,
            operational,
            stack: None,
            source: None,
        }
    }

    /// 500, not operational.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR, false)
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_source(mut self, source: HookError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl From<&FatalEvent> for AppError {
    fn from(event: &FatalEvent) -> Self {
        let error = event.error();
        let name = match event.kind() {
            FatalKind::UncaughtException => "UncaughtException",
            FatalKind::UnhandledRejection => "UnhandledRejection",
        };
        let app = AppError::internal(format!("{}: {}", event.kind().label(), error.message())).named(name);
        match error.stack() {
            Some(stack) => app.with_stack(stack),
            None => app,
        }
    }
}

impl From<TaskError> for AppError {
    fn from(failure: TaskError) -> Self {
        let name = match &failure {
            TaskError::Timeout { .. } => "CleanupTimeout",
            TaskError::Failed { .. } => "CleanupFailure",
            TaskError::Panicked { .. } => "CleanupPanic",
        };
        AppError::internal(failure.to_string())
            .named(name)
            .with_source(Box::new(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::events::FatalError;
    use std::error::Error;
    use std::time::Duration;

    #[test]
    fn create_app_error() {
        let err = AppError::new("Test Error", StatusCode::IM_A_TEAPOT, false);
        assert_eq!(err.message(), "Test Error");
        assert_eq!(err.status(), StatusCode::IM_A_TEAPOT);
        assert!(!err.is_operational());
        assert_eq!(err.name(), "AppError");
    }

    #[test]
    fn internal_defaults() {
        let err = AppError::internal("db gone");
        assert_eq!(err.status().as_u16(), 500);
        assert!(!err.is_operational());
    }

    #[test]
    fn fatal_event_message() {
        let event = FatalEvent::uncaught_exception(FatalError::new("boom"));
        let err = AppError::from(&event);
        assert_eq!(err.to_string(), "Uncaught Exception: boom");
        assert_eq!(err.name(), "UncaughtException");

        let event = FatalEvent::unhandled_rejection(FatalError::new("lost"));
        assert_eq!(AppError::from(&event).message(), "Unhandled Rejection: lost");
    }

    #[test]
    fn task_error_keeps_source() {
        let err = AppError::from(TaskError::Timeout {
            name: "on_shutdown",
            after: Duration::from_secs(10),
        });
        assert_eq!(err.name(), "CleanupTimeout");
        assert_eq!(err.message(), "on_shutdown timed out after 10s");
        assert!(err.source().is_some());
    }
}
