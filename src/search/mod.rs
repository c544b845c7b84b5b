mod catalog;
mod engine;
pub mod query;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

pub use catalog::{FieldKind, FieldSpec, IndexSpec, film_index, genre_index, person_index};
pub use engine::TantivySearch;
pub use query::{Query, SearchRequest, SortField, SortOrder};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("document '{id}' not found in index '{index}'")]
    NotFound { index: String, id: String },
    #[error("unknown index '{0}'")]
    UnknownIndex(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("search backend failure: {0}")]
    Backend(#[from] tantivy::TantivyError),
    #[error("malformed stored document: {0}")]
    Storage(#[from] serde_json::Error),
    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One search hit: the document id and its stored source fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs `request` against `index`. No matches is an empty vector, not an error.
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, SearchError>;

    /// Point lookup. Fails with [`SearchError::NotFound`] when the id is absent.
    async fn get(&self, index: &str, id: &str) -> Result<Value, SearchError>;
}

/// A search backend bound to a single index.
#[derive(Clone)]
pub struct SearchRepository {
    backend: Arc<dyn SearchBackend>,
    index: String,
}

impl SearchRepository {
    pub fn new(backend: Arc<dyn SearchBackend>, index: impl Into<String>) -> Self {
        Self {
            backend,
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Hit>, SearchError> {
        self.backend.search(&self.index, request).await
    }

    /// Point lookup where a missing document is `None` rather than an error.
    pub async fn get(&self, id: &str) -> Result<Option<Value>, SearchError> {
        match self.backend.get(&self.index, id).await {
            Ok(source) => Ok(Some(source)),
            Err(SearchError::NotFound { index, id }) => {
                warn!(%index, %id, "document not found");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
