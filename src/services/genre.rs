use tracing::instrument;

use crate::cache::{CacheAside, CacheKey};
use crate::models::Genre;
use crate::search::query::SCAN_LIMIT;
use crate::search::{Query, SearchError, SearchRepository, SearchRequest};

use super::{decode, decode_hits};

const CACHE_PREFIX: &str = "genre";

#[derive(Clone)]
pub struct GenreService {
    repo: SearchRepository,
    cache: CacheAside,
}

impl GenreService {
    pub fn new(repo: SearchRepository, cache: CacheAside) -> Self {
        Self { repo, cache }
    }

    /// Genre whose name equals `name` exactly. When several share it, the index ranking picks one.
    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Genre>, SearchError> {
        let request = SearchRequest::new(Query::match_field("name", name)).limit(1);
        let hits = self.repo.search(&request).await?;
        Ok(hits
            .into_iter()
            .next()
            .and_then(|hit| decode(self.repo.index(), &hit.id, hit.source)))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, genre_id: &str) -> Result<Option<Genre>, SearchError> {
        let key = CacheKey::new(CACHE_PREFIX, genre_id);
        self.cache
            .get_or_fetch(&key, || self.fetch(genre_id))
            .await
    }

    async fn fetch(&self, genre_id: &str) -> Result<Option<Genre>, SearchError> {
        let source = self.repo.get(genre_id).await?;
        Ok(source.and_then(|source| decode(self.repo.index(), genre_id, source)))
    }

    /// Every genre in the catalog, unpaginated.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Genre>, SearchError> {
        let request = SearchRequest::new(Query::MatchAll).limit(SCAN_LIMIT);
        let hits = self.repo.search(&request).await?;
        Ok(decode_hits(self.repo.index(), hits))
    }
}
