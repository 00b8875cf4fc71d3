//! Running HTTP server closed through the listener adapter.

use std::time::Duration;

use graceful_exit::http::HttpServer;
use graceful_exit::lifecycle::{ExitCode, FatalReporter, ShutdownConfig, ShutdownTrigger};
use graceful_exit::net::close_listener;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

mod common;

async fn start_server(reporter: FatalReporter) -> graceful_exit::http::ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    HttpServer::new(reporter).spawn(listener).unwrap()
}

#[tokio::test]
async fn serves_until_closed() {
    let (coordinator, _exit) = common::coordinator(ShutdownConfig::default());
    let server = start_server(FatalReporter::attach(coordinator)).await;
    let addr = server.local_addr();

    let response = common::raw_get(addr, "/").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("ok"), "{}", response);

    let hook = close_listener(server);
    hook(CancellationToken::new()).await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn graceful_shutdown_closes_server_and_exits_zero() {
    let (coordinator, exit) = common::coordinator(ShutdownConfig::default());
    let server = start_server(FatalReporter::attach(coordinator.clone())).await;
    let addr = server.local_addr();

    coordinator.configure(ShutdownConfig::default().with_listener(server));
    coordinator.run_graceful_shutdown(ShutdownTrigger::Terminate).await;

    assert_eq!(exit.codes(), vec![ExitCode::Success]);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn reject_route_reaches_crash_path() {
    let (coordinator, exit) = common::coordinator(ShutdownConfig::default());
    let server = start_server(FatalReporter::attach(coordinator)).await;

    let response = common::raw_get(server.local_addr(), "/reject").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 202"), "{}", response);

    for _ in 0..100 {
        if !exit.codes().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(exit.codes(), vec![ExitCode::Failure]);
}

#[tokio::test]
async fn rejection_ignored_when_disabled() {
    let config = ShutdownConfig::default().with_exit_on_unhandled_rejection(false);
    let (coordinator, exit) = common::coordinator(config);
    let server = start_server(FatalReporter::attach(coordinator)).await;
    let addr = server.local_addr();

    let response = common::raw_get(addr, "/reject").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 202"), "{}", response);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(exit.codes().is_empty());
    // Still serving.
    let response = common::raw_get(addr, "/").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
}
