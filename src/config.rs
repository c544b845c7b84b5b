use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::cache::DEFAULT_TTL;

/// Names of the search indexes holding each catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogNames {
    pub films: String,
    pub genres: String,
    pub persons: String,
}

impl Default for CatalogNames {
    fn default() -> Self {
        Self {
            films: "movies".to_string(),
            genres: "genres".to_string(),
            persons: "persons".to_string(),
        }
    }
}

/// Application configuration driven by environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub redis_url: Option<String>,
    pub cache_ttl: Duration,
    pub catalogs: CatalogNames,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env::var("MOVIES_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let index_dir = env::var("MOVIES_INDEX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("index"));

        let bind_addr: SocketAddr = env::var("MOVIES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .context("parsing MOVIES_BIND_ADDR")?;

        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let cache_ttl = match env::var("MOVIES_CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("parsing MOVIES_CACHE_TTL_SECS '{raw}'"))?,
            ),
            Err(_) => DEFAULT_TTL,
        };

        let defaults = CatalogNames::default();
        let catalogs = CatalogNames {
            films: env::var("ES_FILM_INDEX").unwrap_or(defaults.films),
            genres: env::var("ES_GENRE_INDEX").unwrap_or(defaults.genres),
            persons: env::var("ES_PERSON_INDEX").unwrap_or(defaults.persons),
        };

        Ok(Self {
            data_dir,
            index_dir,
            bind_addr,
            redis_url,
            cache_ttl,
            catalogs,
        })
    }
}
