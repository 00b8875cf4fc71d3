//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router (health and fault-injection endpoints)
//! - Wire up middleware (tracing, in-flight request tracking)
//! - Run the server with graceful shutdown on its own task
//! - Expose the running server as a [`Closable`] for the coordinator

use std::net::SocketAddr;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::http::error::AppError;
use crate::lifecycle::hooks::{HookError, HookResult};
use crate::lifecycle::signals::FatalReporter;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::Closable;
use crate::observability::logging::{log_warning, RequestInfo};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reporter: FatalReporter,
    pub tracker: ConnectionTracker,
}

/// HTTP server whose lifetime is driven by the shutdown coordinator.
pub struct HttpServer {
    router: Router,
    tracker: ConnectionTracker,
}

impl HttpServer {
    pub fn new(reporter: FatalReporter) -> Self {
        let tracker = ConnectionTracker::new();
        let state = AppState {
            reporter,
            tracker: tracker.clone(),
        };
        Self {
            router: Self::build_router(state),
            tracker,
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/panic", get(panic_handler))
            .route("/reject", get(reject_handler))
            .layer(middleware::from_fn_with_state(state.clone(), track_requests))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Start serving on `listener` in the background.
    pub fn spawn(self, listener: TcpListener) -> Result<ServerHandle, std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router;
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(ServerHandle {
            addr,
            shutdown_tx,
            task,
            tracker: self.tracker,
        })
    }
}

/// A running server. Closing it stops accepting and drains in-flight requests.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
    tracker: ConnectionTracker,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn in_flight(&self) -> u64 {
        self.tracker.active_count()
    }
}

impl Closable for ServerHandle {
    fn close(self: Box<Self>) -> BoxFuture<'static, HookResult> {
        let in_flight = self.in_flight();
        let ServerHandle {
            addr,
            shutdown_tx,
            task,
            tracker,
        } = *self;

        async move {
            tracing::info!(
                address = %addr,
                in_flight,
                "HTTP server closing"
            );
            // The server may already have stopped on its own.
            let _ = shutdown_tx.send(());

            match task.await {
                Ok(Ok(())) => {
                    tracker.drained().await;
                    tracing::info!(address = %addr, "HTTP server stopped");
                    Ok(())
                }
                Ok(Err(e)) => Err(HookError::from(e)),
                Err(e) => Err(HookError::from(format!("server task failed: {}", e))),
            }
        }
        .boxed()
    }
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let guard = state.tracker.track();
    tracing::debug!(
        request_id = %guard.id(),
        method = %request.method(),
        path = %request.uri().path(),
        "Request started"
    );
    next.run(request).await
}

async fn root_handler() -> &'static str {
    "ok"
}

/// Panics on a detached task: the panic escapes every handler.
async fn panic_handler() -> impl IntoResponse {
    tokio::spawn(async {
        panic!("panic requested via /panic");
    });
    (StatusCode::ACCEPTED, "panic scheduled")
}

/// Fails a detached task nobody awaits.
async fn reject_handler(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    let info = RequestInfo::from_request(&request);
    log_warning("Scheduling a background failure", Some(&info));

    // Nobody awaits the handle.
    drop(
        state
            .reporter
            .spawn(async { Err::<(), _>(AppError::internal("background job failed")) }),
    );
    (StatusCode::ACCEPTED, "rejection scheduled")
}
