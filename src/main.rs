use std::sync::Arc;

use anyhow::{Context, Result};
use movies_api::api;
use movies_api::cache::{CacheAside, CacheStore, MemoryCache, RedisCache};
use movies_api::config::AppConfig;
use movies_api::loader;
use movies_api::services::Services;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .pretty()
        .init();

    let config = AppConfig::from_env()?;
    info!(
        data_dir = %config.data_dir.display(),
        index_dir = %config.index_dir.display(),
        bind_addr = %config.bind_addr,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "loaded configuration"
    );

    let search = loader::prepare_search(&config).await?;

    let store: Arc<dyn CacheStore> = match config.redis_url.as_deref() {
        Some(url) => Arc::new(
            RedisCache::connect(url)
                .await
                .context("connecting to redis")?,
        ),
        None => {
            info!("REDIS_URL not set; using in-process cache");
            Arc::new(MemoryCache::new())
        }
    };
    let cache = CacheAside::new(store, config.cache_ttl);

    let services = Services::new(Arc::new(search), cache, &config.catalogs);
    let app = api::router(api::AppState::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "starting http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
