//! In-flight request accounting.
//!
//! # Responsibilities
//! - Label each request with a process-unique ID for log correlation
//! - Count requests the server is still working on
//! - Let a closing server wait until that count reaches zero

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

/// Process-unique request label, rendered as `req-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Counter {
    active: AtomicU64,
    idle: Notify,
}

/// Shared count of requests being served.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counter: Arc<Counter>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one request as started. It counts until the guard is dropped.
    pub fn track(&self) -> ConnectionGuard {
        self.counter.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            counter: Arc::clone(&self.counter),
            id: RequestId::next(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.counter.active.load(Ordering::SeqCst)
    }

    /// Resolve once no request is in flight.
    pub async fn drained(&self) {
        loop {
            let idle = self.counter.idle.notified();
            tokio::pin!(idle);
            // Register before checking so a drop in between is not missed.
            idle.as_mut().enable();
            if self.active_count() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// One in-flight request.
#[derive(Debug)]
pub struct ConnectionGuard {
    counter: Arc<Counter>,
    id: RequestId,
}

impl ConnectionGuard {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.counter.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counter.idle.notify_waiters();
        }
        tracing::trace!(request_id = %self.id, "Request finished");
    }
}
