//! Code Plaza host
//!
//! Runs the session host for the local identity. The presentation layer
//! talks to it in JSON lines: intents on stdin, messages on stdout.
//! Logs go to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

use plaza_core::config::AppConfig;
use plaza_core::error::AppError;
use plaza_host::{HostInbound, HostOutbound, IdentityStore, SessionHost};
use plaza_presence::PresenceEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("PLAZA_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing on stderr; stdout carries the UI protocol
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Code Plaza host v{}", env!("CARGO_PKG_VERSION"));

    let engine = PresenceEngine::from_config(&config).await?;
    let local = IdentityStore::open(&config.host.state_dir).await?;

    let (out_tx, out_rx) = mpsc::channel(config.host.outbound_buffer_size);
    let writer = tokio::spawn(write_outbound(out_rx));

    let host = Arc::new(SessionHost::new(engine, local, &config.host, out_tx).await?);
    tracing::info!(identity = %host.identity(), "Host ready, reading intents from stdin");

    tokio::select! {
        result = read_inbound(Arc::clone(&host)) => result?,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    host.stop().await;
    drop(host);
    let _ = writer.await;

    tracing::info!("Code Plaza host stopped");
    Ok(())
}

/// Dispatch one intent per stdin line until EOF
async fn read_inbound(host: Arc<SessionHost>) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<HostInbound>(line) {
            Ok(message) => host.handle(message).await,
            Err(e) => tracing::warn!(error = %e, "Ignoring unrecognised intent"),
        }
    }

    tracing::debug!("stdin closed");
    Ok(())
}

/// Write each outbound message as a JSON line on stdout
async fn write_outbound(mut rx: mpsc::Receiver<HostOutbound>) {
    let mut stdout = tokio::io::stdout();

    while let Some(message) = rx.recv().await {
        let mut line = match serde_json::to_vec(&message) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound message");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = stdout.write_all(&line).await {
            tracing::warn!(error = %e, "stdout closed");
            break;
        }
        let _ = stdout.flush().await;
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
