use tracing::{debug, instrument, warn};

use crate::cache::{CacheAside, CacheKey};
use crate::models::{Film, FilmDetails, FilmDocument, Genre, PersonFilmWork, Role};
use crate::pagination::Page;
use crate::search::query::SCAN_LIMIT;
use crate::search::{Query, SearchError, SearchRepository, SearchRequest, SortField};

use super::genre::GenreService;
use super::{decode, decode_hits};

const CACHE_PREFIX: &str = "film";
const SEARCH_FIELDS: [&str; 2] = ["title", "description"];

#[derive(Clone)]
pub struct FilmService {
    repo: SearchRepository,
    cache: CacheAside,
    genres: GenreService,
}

impl FilmService {
    pub fn new(repo: SearchRepository, cache: CacheAside, genres: GenreService) -> Self {
        Self {
            repo,
            cache,
            genres,
        }
    }

    /// Film details with every genre name resolved, cached as a whole.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, film_id: &str) -> Result<Option<FilmDetails>, SearchError> {
        let key = CacheKey::new(CACHE_PREFIX, film_id);
        self.cache
            .get_or_fetch(&key, || self.assemble_details(film_id))
            .await
    }

    async fn assemble_details(&self, film_id: &str) -> Result<Option<FilmDetails>, SearchError> {
        let Some(source) = self.repo.get(film_id).await? else {
            return Ok(None);
        };
        let Some(document) = decode::<FilmDocument>(self.repo.index(), film_id, source) else {
            return Ok(None);
        };

        let mut genres = Vec::with_capacity(document.genres.len());
        for name in &document.genres {
            match self.genres.get_by_name(name).await? {
                Some(genre) => genres.push(genre),
                None => warn!(%film_id, genre = %name, "film references unknown genre"),
            }
        }
        Ok(Some(document.into_details(genres)))
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, page: Page) -> Result<Vec<Film>, SearchError> {
        let request = SearchRequest::new(Query::MultiMatch {
            text: query.to_string(),
            fields: SEARCH_FIELDS.iter().map(|field| field.to_string()).collect(),
        })
        .window(page.offset(), page.size);
        let hits = self.repo.search(&request).await?;
        Ok(decode_hits(self.repo.index(), hits))
    }

    /// Films ordered by a single `[-]field` sort key, optionally restricted to one genre.
    ///
    /// A genre id that resolves to no genre yields an empty page.
    #[instrument(skip(self))]
    pub async fn list_films(
        &self,
        sort: &str,
        page: Page,
        genre_id: Option<&str>,
    ) -> Result<Vec<Film>, SearchError> {
        let sort = SortField::parse(sort)?;
        let query = match genre_id {
            Some(genre_id) => match self.genres.get_by_id(genre_id).await? {
                Some(genre) => Query::match_field("genres", genre.name),
                None => {
                    debug!(%genre_id, "genre filter matches no genre");
                    return Ok(Vec::new());
                }
            },
            None => Query::MatchAll,
        };

        let request = SearchRequest::new(query)
            .sorted_by(sort)
            .window(page.offset(), page.size);
        let hits = self.repo.search(&request).await?;
        Ok(decode_hits(self.repo.index(), hits))
    }

    /// Credits of everyone named `name`. People sharing a name share credits.
    #[instrument(skip(self))]
    pub async fn find_credits_by_person_name(
        &self,
        name: &str,
    ) -> Result<Vec<PersonFilmWork>, SearchError> {
        let request = SearchRequest::new(any_role_query("name", name)).limit(SCAN_LIMIT);
        let hits = self.repo.search(&request).await?;

        let credits = decode_hits::<FilmDocument>(self.repo.index(), hits)
            .into_iter()
            .filter_map(|film| {
                let roles = film.roles_of(name);
                (!roles.is_empty()).then_some(PersonFilmWork { id: film.id, roles })
            })
            .collect();
        Ok(credits)
    }

    #[instrument(skip(self))]
    pub async fn find_credits_by_person_id(&self, person_id: &str) -> Result<Vec<Film>, SearchError> {
        let request = SearchRequest::new(any_role_query("id", person_id)).limit(SCAN_LIMIT);
        let hits = self.repo.search(&request).await?;
        Ok(decode_hits(self.repo.index(), hits))
    }

    /// Films sharing any of `genres`. The film the genres came from is not excluded.
    #[instrument(skip_all, fields(genres = genres.len()))]
    pub async fn get_by_genres(&self, genres: &[Genre]) -> Result<Vec<Film>, SearchError> {
        let clauses = genres
            .iter()
            .map(|genre| Query::match_field("genres", genre.name.clone()))
            .collect();
        let request = SearchRequest::new(Query::should(clauses));
        let hits = self.repo.search(&request).await?;
        Ok(decode_hits(self.repo.index(), hits))
    }

    /// Films alike to `film_id`, or `None` when the film itself does not exist.
    #[instrument(skip(self))]
    pub async fn similar(&self, film_id: &str) -> Result<Option<Vec<Film>>, SearchError> {
        let Some(film) = self.get_by_id(film_id).await? else {
            return Ok(None);
        };
        Ok(Some(self.get_by_genres(&film.genres).await?))
    }
}

/// Matches films where `field` of any role group equals `value`.
fn any_role_query(field: &str, value: &str) -> Query {
    let clauses = Role::ALL
        .into_iter()
        .map(|role| {
            let group = role.group();
            Query::nested(group, Query::match_field(format!("{group}.{field}"), value))
        })
        .collect();
    Query::should_at_least(clauses, 1)
}
