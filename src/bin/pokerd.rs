//! pokerd - Planning-poker room server
//!
//! Serves planning-poker rooms to browser clients over WebSocket.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:3001 (or $PORT)
//! pokerd
//!
//! # Listen on a specific address
//! pokerd --host 127.0.0.1 --port 8080
//! ```

use std::env;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pokerd::config::ServerConfig;
use pokerd::coordinator::spawn_coordinator;
use pokerd::server::PokerServer;

/// Planning-poker room server
#[derive(Parser, Debug)]
#[command(name = "pokerd", version, about)]
struct Args {
    /// Address to listen on (falls back to $POKERD_HOST, then 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (falls back to $PORT, then 3001)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "pokerd starting"
    );

    let config = ServerConfig::resolve(args.host, args.port)
        .context("Failed to resolve server configuration")?;

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let coordinator = spawn_coordinator();
    info!("Room coordinator started");

    let server = PokerServer::bind(&config, coordinator, cancel_token)
        .await
        .with_context(|| format!("Failed to start server on {}", config.bind_addr))?;

    server.run().await.context("Server error")?;

    info!("pokerd stopped");
    Ok(())
}

/// Log directives used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_DIRECTIVES: &str = "pokerd=info,poker_core=info,poker_protocol=info";

/// Builds the log filter from a `RUST_LOG` value, falling back to the defaults.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
