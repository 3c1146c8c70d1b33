use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamscout_core::{
    load_config, validate_config, HttpStoreFactory, OrchestratorConfig, SanitizedConfig,
    SearchApiClient, SearchCaches, SearchOrchestrator, StreamAssembler, TmdbClient,
};
use streamscout_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` filter, plain or JSON output per `STREAMSCOUT_LOG_FORMAT`.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("STREAMSCOUT_LOG_FORMAT").as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("STREAMSCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        search_api = %config.search_api.base_url,
        public_url = %config.stream.base_url,
        "Configuration loaded"
    );
    if config.tmdb.access_token.is_none() {
        warn!("No default TMDB token; anime enrichment needs a per-user token");
    }

    let searcher = SearchApiClient::new(&config.search_api)
        .context("Failed to create search API client")?;
    let stores = HttpStoreFactory::new(&config.stores, config.resolver.lookup_timeout())
        .context("Failed to create storage clients")?;
    let tmdb = TmdbClient::new(&config.tmdb).context("Failed to create TMDB client")?;

    let caches = SearchCaches::new(&config.cache);
    let sweeper = caches.spawn_sweeper(config.cache.sweep_interval());
    info!(
        search_ttl_secs = config.cache.search_ttl_secs,
        metadata_ttl_secs = config.cache.metadata_ttl_secs,
        "Caches initialized"
    );

    let orchestrator = SearchOrchestrator::new(
        Arc::new(searcher),
        Arc::new(stores),
        caches,
        StreamAssembler::new(&config.stream.base_url, &config.stream.addon_name),
        OrchestratorConfig::from(&config.resolver),
    )
    .with_metadata(Arc::new(tmdb));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, Arc::new(orchestrator)));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.abort();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
