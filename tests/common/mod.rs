//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use graceful_exit::lifecycle::{
    Coordinator, ExitCode, HookResult, LifecycleState, ProcessExit, ShutdownConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Records exit codes instead of terminating the test process.
#[derive(Default)]
pub struct RecordingExit {
    codes: Mutex<Vec<ExitCode>>,
}

impl RecordingExit {
    pub fn codes(&self) -> Vec<ExitCode> {
        self.codes.lock().unwrap().clone()
    }
}

impl ProcessExit for RecordingExit {
    fn exit(&self, code: ExitCode) {
        self.codes.lock().unwrap().push(code);
    }
}

/// Build a coordinator wired to a [`RecordingExit`].
pub fn coordinator(config: ShutdownConfig) -> (Arc<Coordinator>, Arc<RecordingExit>) {
    let exit = Arc::new(RecordingExit::default());
    let coordinator = Arc::new(Coordinator::with_exit(config, exit.clone()));
    (coordinator, exit)
}

/// Counts invocations and keeps every token a hook received.
#[derive(Clone, Default)]
pub struct HookProbe {
    calls: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<CancellationToken>>>,
}

impl HookProbe {
    pub fn record(&self, token: &CancellationToken) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.clone());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn token(&self, index: usize) -> CancellationToken {
        self.tokens.lock().unwrap()[index].clone()
    }
}

/// A hook error whose `Display` panics.
#[derive(Debug)]
pub struct Unrenderable;

impl fmt::Display for Unrenderable {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        panic!("error message cannot be rendered");
    }
}

impl std::error::Error for Unrenderable {}

/// Body for a hook that panics instead of settling.
pub fn explode(message: &str) -> HookResult {
    panic!("{}", message)
}

/// Yield until the coordinator has left `Running`.
pub async fn wait_for_shutdown_start(coordinator: &Coordinator) {
    while coordinator.state() == LifecycleState::Running {
        tokio::task::yield_now().await;
    }
}

/// Issue a bare HTTP/1.1 GET and return the raw response.
pub async fn raw_get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "response timed out"))??;
    Ok(response)
}
