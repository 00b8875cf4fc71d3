//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide the error/warning/info/debug helpers the rest of the crate calls
//! - Keep logging failures from escaping into the caller
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `RUST_LOG` wins over the configured filter
//! - Stacks are only logged in development environments

use std::cell::Cell;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::Request;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::http::error::AppError;
use crate::lifecycle::task::TaskError;

static DEV_MODE: AtomicBool = AtomicBool::new(false);

thread_local! {
    static RENDERING: Cell<bool> = const { Cell::new(false) };
}

/// Install the global subscriber. Later calls only update the dev-mode flag.
pub fn init_logging(config: &AppConfig) {
    set_dev_mode(config.is_dev());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.logging.with_target))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

pub fn set_dev_mode(enabled: bool) {
    DEV_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_dev_mode() -> bool {
    DEV_MODE.load(Ordering::Relaxed)
}

/// The request an error was raised for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method().as_str(), request.uri().to_string())
    }
}

/// Log an application error. Never panics.
pub fn log_error(error: &AppError, request: Option<&RequestInfo>) {
    guarded(|| {
        let (method, url) = request
            .map(|r| (r.method.as_str(), r.url.as_str()))
            .unwrap_or_default();
        let stack = if is_dev_mode() { error.stack() } else { None };
        let cause = std::error::Error::source(error).map(|s| s.to_string());

        tracing::error!(
            name = error.name(),
            status_code = error.status().as_u16(),
            operational = error.is_operational(),
            method,
            url,
            cause = cause.as_deref().unwrap_or("-"),
            stack = stack.unwrap_or("-"),
            "{}",
            error.message()
        );
    });
}

pub fn log_warning(message: impl Display, request: Option<&RequestInfo>) {
    guarded(|| match request {
        Some(r) => tracing::warn!(method = %r.method, url = %r.url, "{}", message),
        None => tracing::warn!("{}", message),
    });
}

/// Log a failed cleanup task. The hook's error is rendered under the guard too.
pub fn log_task_failure(failure: TaskError) {
    guarded(|| log_error(&AppError::from(failure), None));
}

/// Whether the current thread is inside a guarded logging call.
pub(crate) fn is_rendering() -> bool {
    RENDERING.with(Cell::get)
}

fn guarded(f: impl FnOnce()) {
    let outer = RENDERING.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    RENDERING.with(|flag| flag.set(outer));

    if outcome.is_err() {
        eprintln!("logging failed: message could not be rendered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::fmt;

    #[derive(Debug)]
    struct Exploding;

    impl Display for Exploding {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("cannot render");
        }
    }

    impl std::error::Error for Exploding {}

    #[test]
    fn request_info_from_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/orders?id=7")
            .body(Body::empty())
            .unwrap();
        let info = RequestInfo::from_request(&request);
        assert_eq!(info, RequestInfo::new("POST", "/orders?id=7"));
    }

    #[test]
    fn logging_failures_are_contained() {
        // Rendering only happens when a subscriber is interested.
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt().with_test_writer().finish(),
        );
        log_warning(Exploding, None);
        assert!(!is_rendering());
    }

    #[test]
    fn unrenderable_task_failure_is_contained() {
        // No subscriber needed: the task error is rendered while building the AppError.
        log_task_failure(TaskError::Failed {
            name: "on_shutdown",
            source: Box::new(Exploding),
        });
        assert!(!is_rendering());
    }

    #[test]
    fn log_error_accepts_any_request() {
        let err = AppError::internal("boom").with_stack("at src/lib.rs:1:1");
        log_error(&err, None);
        log_error(&err, Some(&RequestInfo::new("GET", "/test")));
    }
}
