//! rest-minio-proxy
//!
//! Serves objects from an S3-compatible bucket over plain HTTP GET.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rest_minio_proxy::api::ProxyServer;
use rest_minio_proxy::config::ProxyConfig;
use rest_minio_proxy::error::Result;
use rest_minio_proxy::store::S3ObjectStore;

/// Read-only HTTP front-end for S3-compatible object stores
#[derive(Parser)]
#[command(name = "rest-minio-proxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy (default)
    Serve,

    /// Resolve and print the configuration, then exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_serve(cli.config.as_deref()).await,
        Commands::Validate => run_validate(cli.config.as_deref()),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ProxyConfig> {
    ProxyConfig::load(path).map_err(|e| {
        tracing::error!("Unable to start: {}", e);
        e
    })
}

/// Start the proxy and serve until interrupted
async fn run_serve(config_path: Option<&Path>) -> Result<()> {
    tracing::info!("Starting rest-minio-proxy...");

    let config = load_config(config_path)?;

    let store = match S3ObjectStore::new(&config.store) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to set up object store client: {}", e);
            return Err(e);
        }
    };

    let server = ProxyServer::new(&config, store);
    tracing::info!("Startup complete");

    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("{}", e);
        return Err(e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Validate configuration
fn run_validate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", config.to_redacted_toml()?);
    println!("Configuration is valid");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
