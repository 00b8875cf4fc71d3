//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Running server
//!     → connection.rs (in-flight request tracking)
//!     → listener.rs (Closable resource → close_server hook)
//!     → Shutdown coordinator runs the hook under its deadline
//! ```
//!
//! # Design Decisions
//! - Closing is cooperative; an abandoned close keeps running in the background
//! - A resource is closed at most once

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionTracker, RequestId};
pub use listener::{close_listener, Closable};
