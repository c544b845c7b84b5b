use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::pagination::Page;
use crate::search::SearchError;

pub const DEFAULT_FILM_SORT: &str = "-imdb_rating";

#[derive(Debug, Deserialize)]
pub struct FilmListParams {
    #[serde(default, alias = "genre")]
    pub genre_id: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page_number: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page_number: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl SearchParams {
    pub fn query_text(&self) -> Result<&str, ApiError> {
        match self.query.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ApiError::bad_request("query must not be empty")),
        }
    }
}

pub fn page_from(number: Option<usize>, size: Option<usize>) -> Result<Page, ApiError> {
    Page::new(
        number.unwrap_or(Page::DEFAULT_NUMBER),
        size.unwrap_or(Page::DEFAULT_SIZE),
    )
    .ok_or_else(|| ApiError::bad_request("page_number and page_size must be at least 1"))
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<anyhow::Error>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
            detail: Some(err),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let Some(detail) = &self.detail {
            tracing::error!(error = %detail);
        }
        let body = Json(ErrorBody {
            detail: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidQuery(message) => ApiError::bad_request(message),
            other => ApiError::internal(other.into()),
        }
    }
}
