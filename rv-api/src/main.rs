//! rv-api (Recipe Vault) - recipe import and storage service
//!
//! Resolves configuration, opens (or creates) the SQLite database and serves
//! the JSON API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use rv_api::config::Args;
use rv_api::scraper::HttpRecipeScraper;
use rv_api::{build_router, cors_layer, AppState};
use rv_common::config::{load_toml_config, ServiceConfig};
use rv_common::db::init_database;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before logging starts so its log level applies;
    // problems with it are reported once the subscriber is up
    let config_path = args.config_path();
    let (file_config, config_error) = match config_path.as_deref().map(load_toml_config) {
        Some(Ok(file)) => (file, None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let config = ServiceConfig::resolve(args.overrides(), file_config);

    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("rv_api={level},rv_common={level},tower_http={level}"))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recipe Vault API (rv-api) v{}", env!("CARGO_PKG_VERSION"));

    if let Some(e) = config_error {
        warn!("Ignoring config file: {}", e);
    }
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e).context("Database initialization failed");
        }
    };

    let scraper = HttpRecipeScraper::new(config.scrape_timeout)
        .context("Failed to create recipe scraper")?;

    let cors = cors_layer(&config.allow_origin)
        .with_context(|| format!("Invalid allowed origin: {}", config.allow_origin))?;

    let state = AppState::new(pool, Arc::new(scraper));
    let app = build_router(state).layer(cors);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("rv-api listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

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
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
