//! # agri-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the Agri Stack API. Configuration comes
//! from the environment (see [`agri_api::config`]); command-line flags
//! override the port and log format.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agri_api::config::{AppConfig, LogFormat};
use agri_api::state::AppState;

/// Agri Stack API server.
#[derive(Parser, Debug)]
#[command(name = "agri-api", version, about, long_about = None)]
struct Args {
    /// Port to listen on. Overrides `PORT`.
    #[arg(long)]
    port: Option<u16>,

    /// Log line format. Overrides `AGRI_LOG_FORMAT`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::debug!(?config, "configuration loaded");

    // Database pool is optional; absent means in-memory only.
    let db_pool = agri_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;

    let mailer = agri_api::mail::mailer_from_config(&config.mail)?;

    let port = config.port;
    let state = AppState::with_config(config, db_pool, mailer);

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        anyhow::anyhow!(e)
    })?;

    let app = agri_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Agri API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
