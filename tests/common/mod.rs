#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use movies_api::cache::{CacheAside, DEFAULT_TTL, MemoryCache};
use movies_api::config::CatalogNames;
use movies_api::loader::catalog_specs;
use movies_api::search::{Hit, SearchBackend, SearchError, SearchRequest, TantivySearch};
use movies_api::services::Services;
use serde_json::{Value, json};
use uuid::Uuid;

/// Search backend that counts calls before delegating to an in-memory engine.
pub struct CountingBackend {
    pub engine: TantivySearch,
    searches: AtomicUsize,
    gets: AtomicUsize,
}

impl CountingBackend {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.searches() + self.gets()
    }
}

#[async_trait]
impl SearchBackend for CountingBackend {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.engine.search(index, request).await
    }

    async fn get(&self, index: &str, id: &str) -> Result<Value, SearchError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.engine.get(index, id).await
    }
}

pub struct Fixture {
    pub backend: Arc<CountingBackend>,
    pub services: Services,
    pub catalogs: CatalogNames,
}

impl Fixture {
    pub fn new() -> Self {
        let catalogs = CatalogNames::default();
        let engine = TantivySearch::in_ram(&catalog_specs(&catalogs)).unwrap();
        let backend = Arc::new(CountingBackend {
            engine,
            searches: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        });
        let cache = CacheAside::new(Arc::new(MemoryCache::new()), DEFAULT_TTL);
        let services = Services::new(backend.clone(), cache, &catalogs);
        Self {
            backend,
            services,
            catalogs,
        }
    }

    pub async fn add_films(&self, docs: Vec<Value>) {
        self.backend
            .engine
            .index_documents(&self.catalogs.films, docs)
            .await
            .unwrap();
    }

    pub async fn add_genres(&self, docs: Vec<Value>) {
        self.backend
            .engine
            .index_documents(&self.catalogs.genres, docs)
            .await
            .unwrap();
    }

    pub async fn add_persons(&self, docs: Vec<Value>) {
        self.backend
            .engine
            .index_documents(&self.catalogs.persons, docs)
            .await
            .unwrap();
    }
}

pub fn id_of(doc: &Value) -> Uuid {
    doc["id"].as_str().unwrap().parse().unwrap()
}

pub fn genre(name: &str) -> Value {
    json!({"id": Uuid::new_v4(), "name": name})
}

pub fn person(name: &str) -> Value {
    json!({"id": Uuid::new_v4(), "name": name})
}

pub struct FilmDoc {
    pub title: &'static str,
    pub rating: f64,
    pub genres: Vec<&'static str>,
    pub actors: Vec<Value>,
    pub writers: Vec<Value>,
    pub directors: Vec<Value>,
}

impl FilmDoc {
    pub fn new(title: &'static str, rating: f64) -> Self {
        Self {
            title,
            rating,
            genres: Vec::new(),
            actors: Vec::new(),
            writers: Vec::new(),
            directors: Vec::new(),
        }
    }

    pub fn genres(mut self, genres: &[&'static str]) -> Self {
        self.genres = genres.to_vec();
        self
    }

    pub fn actors(mut self, people: &[&Value]) -> Self {
        self.actors = people.iter().map(|p| (*p).clone()).collect();
        self
    }

    pub fn writers(mut self, people: &[&Value]) -> Self {
        self.writers = people.iter().map(|p| (*p).clone()).collect();
        self
    }

    pub fn directors(mut self, people: &[&Value]) -> Self {
        self.directors = people.iter().map(|p| (*p).clone()).collect();
        self
    }

    pub fn build(self) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "title": self.title,
            "imdb_rating": self.rating,
            "description": format!("{} is a film", self.title),
            "genres": self.genres,
            "actors": self.actors,
            "writers": self.writers,
            "directors": self.directors,
        })
    }
}
