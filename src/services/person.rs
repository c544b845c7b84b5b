use tracing::instrument;

use crate::cache::{CacheAside, CacheKey};
use crate::models::{Film, Person, PersonWithFilms};
use crate::pagination::Page;
use crate::search::{Query, SearchError, SearchRepository, SearchRequest};

use super::decode;
use super::film::FilmService;

const CACHE_PREFIX: &str = "person";
const FILM_WORKS_CACHE_PREFIX: &str = "pfw";

#[derive(Clone)]
pub struct PersonService {
    repo: SearchRepository,
    cache: CacheAside,
    films: FilmService,
}

impl PersonService {
    pub fn new(repo: SearchRepository, cache: CacheAside, films: FilmService) -> Self {
        Self { repo, cache, films }
    }

    /// Matching people, each with their credits. Credits are fetched one person at a time.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        page: Page,
    ) -> Result<Vec<PersonWithFilms>, SearchError> {
        let request = SearchRequest::new(Query::match_field("name", query))
            .window(page.offset(), page.size);
        let hits = self.repo.search(&request).await?;

        let mut persons = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(person) = decode::<Person>(self.repo.index(), &hit.id, hit.source) else {
                continue;
            };
            persons.push(self.with_films(person).await?);
        }
        Ok(persons)
    }

    /// Person with credits, cached together; a cache hit does not refresh the credits.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, person_id: &str) -> Result<Option<PersonWithFilms>, SearchError> {
        let key = CacheKey::new(CACHE_PREFIX, person_id);
        self.cache
            .get_or_fetch(&key, || self.fetch(person_id))
            .await
    }

    async fn fetch(&self, person_id: &str) -> Result<Option<PersonWithFilms>, SearchError> {
        let Some(source) = self.repo.get(person_id).await? else {
            return Ok(None);
        };
        match decode::<Person>(self.repo.index(), person_id, source) {
            Some(person) => Ok(Some(self.with_films(person).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_film_works_by_person_id(
        &self,
        person_id: &str,
    ) -> Result<Vec<Film>, SearchError> {
        let key = CacheKey::new(FILM_WORKS_CACHE_PREFIX, person_id);
        self.cache
            .get_or_fetch(&key, || self.films.find_credits_by_person_id(person_id))
            .await
    }

    async fn with_films(&self, person: Person) -> Result<PersonWithFilms, SearchError> {
        let films = self.films.find_credits_by_person_name(&person.name).await?;
        Ok(PersonWithFilms::new(person, films))
    }
}
