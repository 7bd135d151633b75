//! Notes Service
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────┐
//!                     │                 SUPERVISOR                 │
//!                     │                                            │
//!   HTTP  :SERVER_PORT├─▶ http listener ──┐                        │
//!   HTTPS :TLS_PORT   ├─▶ tls listener ───┼─▶ notes routes ──┐     │
//!                     │                   │                  ▼     │
//!   Probes :3040      ├─▶ health listener ┴─▶ readyz ──▶ NoteGateway ──▶ MongoDB
//!                     │                                            │
//!                     │   fatal channel ◀── any listener failure   │
//!                     │   shutdown signal ◀── SIGINT / SIGTERM     │
//!                     └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use notes_service::config::{load_config, ObservabilityConfig, ServiceConfig, TlsFiles};
use notes_service::db::{driver_for_uri, NoteGateway};
use notes_service::lifecycle::{signals, ServiceError, Supervisor};
use notes_service::net::tls;
use notes_service::observability::logging;

#[derive(Parser)]
#[command(name = "notes-service")]
#[command(about = "HTTP API for notes backed by a document store", long_about = None)]
struct Cli {
    /// Optional TOML file with base configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// PEM certificate for the TLS listener
    #[arg(long, alias = "tlsCertLocation")]
    tls_cert: Option<PathBuf>,

    /// PEM private key for the TLS listener
    #[arg(long, alias = "tlsKeyLocation")]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(
        cli.config.as_deref(),
        |name| std::env::var(name).ok(),
        TlsFiles {
            cert_path: cli.tls_cert,
            key_path: cli.tls_key,
        },
    ) {
        Ok(config) => config,
        Err(e) => {
            let defaults = ObservabilityConfig::default();
            logging::init(&defaults.log_filter, defaults.log_format);
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init(
        &config.observability.log_filter,
        config.observability.log_format,
    );
    tls::install_crypto_provider();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = ?config.server.port,
        health_port = config.health.port,
        tls = config.tls.enabled().is_some(),
        "notes-service starting"
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "notes-service exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> Result<(), ServiceError> {
    let driver = driver_for_uri(&config.database.uri)?;
    let gateway = Arc::new(NoteGateway::new(driver, config.database.clone()));

    Supervisor::new(config, gateway)
        .run(signals::spawn_listener())
        .await
}
