//! graceful-exit demo server.
//!
//! Serves a small HTTP app and lets the shutdown coordinator own the process
//! lifetime:
//!
//! ```text
//!   SIGINT / SIGTERM / SIGQUIT ──▶ close server + on_shutdown ──▶ exit 0 | 1
//!   GET /panic  (uncaught)     ──▶ log + on_crash            ──▶ exit 1
//!   GET /reject (unhandled)    ──▶ log + on_crash            ──▶ exit 1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use graceful_exit::config::{load_config, AppConfig};
use graceful_exit::http::HttpServer;
use graceful_exit::lifecycle::{self, Coordinator, ShutdownConfig};
use graceful_exit::observability::init_logging;

#[derive(Parser)]
#[command(name = "graceful-exit")]
#[command(about = "Demo server with coordinated graceful shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config);
    tracing::info!(
        environment = %config.environment,
        dev = config.is_dev(),
        "graceful-exit v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // Bind triggers first so nothing that happens during startup goes unnoticed.
    let coordinator = Arc::new(Coordinator::new(ShutdownConfig::from_settings(&config.shutdown)));
    let reporter = lifecycle::install(Arc::clone(&coordinator))?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(reporter).spawn(listener)?;

    coordinator.configure(
        ShutdownConfig::from_settings(&config.shutdown)
            .with_listener(server)
            .with_on_shutdown(|_token| async move {
                tracing::info!("Flushing application state");
                Ok(())
            })
            .with_on_crash(|error, _token| async move {
                tracing::error!(error = %error, "Crash hook invoked");
                Ok(())
            }),
    );

    // The coordinator exits the process.
    std::future::pending::<()>().await;
    Ok(())
}
