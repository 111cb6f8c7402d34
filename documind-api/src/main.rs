//! documind-api - DocuMind backend service
//!
//! Serves the `/api/*` boundary used by the documind wizard: text processing, voice
//! memo transcription, artifact download, document listings and integration status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use documind_common::config::{load_dotenv, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use documind_api::config::{ApiConfig, ServerOverrides};
use documind_api::services::Services;
use documind_api::AppState;

/// Command-line arguments for documind-api
#[derive(Parser, Debug)]
#[command(name = "documind-api")]
#[command(about = "DocuMind document generation backend")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "DOCUMIND_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DOCUMIND_PORT")]
    port: Option<u16>,

    /// Directory generated PDFs are written to
    #[arg(short, long, env = "DOCUMIND_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Largest accepted audio upload in bytes
    #[arg(long, env = "DOCUMIND_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Deployment name
    #[arg(long, env = "DOCUMIND_ENV")]
    environment: Option<String>,

    /// Config file (default: $DOCUMIND_CONFIG or ~/.config/documind/documind.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "DOCUMIND_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed arguments
    load_dotenv();
    let args = Args::parse();
    let toml = TomlConfig::load_or_default(args.config.as_deref());

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("documind_api={level},tower_http={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::resolve(
        ServerOverrides {
            host: args.host,
            port: args.port,
            output_dir: args.output_dir,
            max_upload_bytes: args.max_upload_bytes,
            environment: args.environment,
        },
        &toml,
    );

    info!("Starting documind-api v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.environment);
    info!("Output directory: {}", config.output_dir.display());
    config.vendors.log_summary();

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let services =
        Services::from_config(&config.vendors).context("Failed to initialize vendor clients")?;
    let state = AppState::new(
        services,
        config.vendors.integration_status(),
        config.output_dir.clone(),
    )
    .with_max_upload_bytes(config.max_upload_bytes);

    let app = documind_api::build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
