use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tordemand_core::{
    load_config, load_config_from_env, validate_config, Config, ProviderRegistry,
};
use tordemand_server::{api::create_router, state::AppState};

/// Config file used when `TORDEMAND_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = resolve_config()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");

    // Register providers per category
    let default_timeout = Duration::from_secs(config.search.provider_timeout_secs as u64);
    let registry = ProviderRegistry::from_config(&config.providers, default_timeout)
        .context("Failed to create providers")?;
    if registry.provider_count() == 0 {
        info!("No providers configured, every search will return no results");
    } else {
        info!(
            providers = registry.provider_count(),
            categories = ?registry.categories(),
            "Providers registered"
        );
    }

    let state = Arc::new(AppState::new(config.clone(), Arc::new(registry)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Load config from `TORDEMAND_CONFIG`, else `config.toml` if present, else
/// defaults plus environment.
fn resolve_config() -> Result<Config> {
    if let Ok(path) = std::env::var("TORDEMAND_CONFIG") {
        let path = PathBuf::from(path);
        info!("Loading configuration from {:?}", path);
        return load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        info!("Loading configuration from {:?}", default_path);
        return load_config(&default_path)
            .with_context(|| format!("Failed to load config from {:?}", default_path));
    }

    info!("No config file found, using defaults and environment");
    load_config_from_env().context("Failed to load config from environment")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
