mod film;
mod genre;
mod person;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub use film::FilmService;
pub use genre::GenreService;
pub use person::PersonService;

use crate::cache::CacheAside;
use crate::config::CatalogNames;
use crate::search::{Hit, SearchBackend, SearchRepository};

/// Every composition service, wired once at startup.
#[derive(Clone)]
pub struct Services {
    pub genres: GenreService,
    pub films: FilmService,
    pub persons: PersonService,
}

impl Services {
    pub fn new(backend: Arc<dyn SearchBackend>, cache: CacheAside, catalogs: &CatalogNames) -> Self {
        let genres = GenreService::new(
            SearchRepository::new(Arc::clone(&backend), &catalogs.genres),
            cache.clone(),
        );
        let films = FilmService::new(
            SearchRepository::new(Arc::clone(&backend), &catalogs.films),
            cache.clone(),
            genres.clone(),
        );
        let persons = PersonService::new(
            SearchRepository::new(backend, &catalogs.persons),
            cache,
            films.clone(),
        );
        Self {
            genres,
            films,
            persons,
        }
    }
}

/// Decodes a stored document, logging and dropping it when it has the wrong shape.
fn decode<T: DeserializeOwned>(index: &str, id: &str, source: Value) -> Option<T> {
    match serde_json::from_value(source) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%index, %id, error = %err, "malformed document");
            None
        }
    }
}

fn decode_hits<T: DeserializeOwned>(index: &str, hits: Vec<Hit>) -> Vec<T> {
    hits.into_iter()
        .filter_map(|hit| decode(index, &hit.id, hit.source))
        .collect()
}
