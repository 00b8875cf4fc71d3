//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request tracking, fault-injection routes)
//!     → error.rs (AppError: status code + operational flag)
//!     → observability::logging (log_error / log_warning)
//!
//! Shutdown:
//!     coordinator → net::listener adapter → ServerHandle::close
//!     → stop accepting → drain in-flight requests
//! ```

pub mod error;
pub mod server;

pub use error::AppError;
pub use server::{HttpServer, ServerHandle};
