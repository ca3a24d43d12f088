//! spegild — caching reverse proxy daemon.
//!
//! Serves GET requests from a local file cache filled lazily from a
//! single origin, and forwards POST requests to that origin verbatim.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spegil::server::{AppContext, Config, build_router};
use spegil::{CacheResolver, Error, LocalStore, OriginClient};

/// Lazy-loading caching reverse proxy.
#[derive(Parser)]
#[command(name = "spegild")]
#[command(version)]
#[command(about = "Caching reverse proxy daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Origin base URL, overriding the config file.
    #[arg(long, env = "SPEGIL_ORIGIN")]
    origin: Option<String>,

    /// Listen address, overriding the config file.
    #[arg(long, env = "SPEGIL_BIND")]
    bind: Option<String>,

    /// Cache root directory, overriding the config file.
    #[arg(long, env = "SPEGIL_CACHE_ROOT")]
    cache_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(origin) = args.origin {
        config.origin.base_url = Some(origin);
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(root) = args.cache_root {
        config.cache.root = root;
    }

    let base_url = config.origin.base_url.clone().ok_or_else(|| {
        Error::Configuration(
            "no origin configured; set [origin].base_url or pass --origin".to_string(),
        )
    })?;

    let store = Arc::new(LocalStore::open(&config.cache.root)?);
    let origin = OriginClient::new(&base_url, config.request_timeout())?;
    let resolver = CacheResolver::new(store, Arc::new(origin.clone()));

    let router = build_router(Arc::new(AppContext { resolver, origin }));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        origin = %base_url,
        cache_root = %config.cache.root.display(),
        "spegild starting"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
