use axum::Json;
use axum::extract::{Path, Query as AxumQuery, State};
use tracing::instrument;

use crate::models::{Film, FilmDetails, Genre, PersonWithFilms};

use super::state::AppState;
use super::types::{ApiError, DEFAULT_FILM_SORT, FilmListParams, SearchParams, page_from};

pub async fn healthz() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
pub async fn list_films(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<FilmListParams>,
) -> Result<Json<Vec<Film>>, ApiError> {
    let page = page_from(params.page_number, params.page_size)?;
    let sort = params.sort.as_deref().unwrap_or(DEFAULT_FILM_SORT);
    let genre_id = params
        .genre_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let films = state.services.films.list_films(sort, page, genre_id).await?;
    Ok(Json(films))
}

#[instrument(skip_all)]
pub async fn search_films(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<SearchParams>,
) -> Result<Json<Vec<Film>>, ApiError> {
    let page = page_from(params.page_number, params.page_size)?;
    let films = state
        .services
        .films
        .search(params.query_text()?, page)
        .await?;
    if films.is_empty() {
        return Err(ApiError::not_found("No films were found"));
    }
    Ok(Json(films))
}

#[instrument(skip_all, fields(%film_id))]
pub async fn film_details(
    State(state): State<AppState>,
    Path(film_id): Path<String>,
) -> Result<Json<FilmDetails>, ApiError> {
    state
        .services
        .films
        .get_by_id(&film_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Film was not found"))
}

#[instrument(skip_all, fields(%film_id))]
pub async fn films_alike(
    State(state): State<AppState>,
    Path(film_id): Path<String>,
) -> Result<Json<Vec<Film>>, ApiError> {
    match state.services.films.similar(&film_id).await? {
        Some(films) if !films.is_empty() => Ok(Json(films)),
        _ => Err(ApiError::not_found("No films alike")),
    }
}

#[instrument(skip_all)]
pub async fn list_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, ApiError> {
    Ok(Json(state.services.genres.list_all().await?))
}

#[instrument(skip_all, fields(%genre_id))]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<String>,
) -> Result<Json<Genre>, ApiError> {
    state
        .services
        .genres
        .get_by_id(&genre_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Genre was not found"))
}

#[instrument(skip_all)]
pub async fn search_persons(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<SearchParams>,
) -> Result<Json<Vec<PersonWithFilms>>, ApiError> {
    let page = page_from(params.page_number, params.page_size)?;
    let persons = state
        .services
        .persons
        .search(params.query_text()?, page)
        .await?;
    if persons.is_empty() {
        return Err(ApiError::not_found("No people were found"));
    }
    Ok(Json(persons))
}

#[instrument(skip_all, fields(%person_id))]
pub async fn person_details(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> Result<Json<PersonWithFilms>, ApiError> {
    state
        .services
        .persons
        .get_by_id(&person_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Person was not found"))
}

#[instrument(skip_all, fields(%person_id))]
pub async fn person_film_works(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> Result<Json<Vec<Film>>, ApiError> {
    let films = state
        .services
        .persons
        .get_film_works_by_person_id(&person_id)
        .await?;
    if films.is_empty() {
        return Err(ApiError::not_found("No film works were found"));
    }
    Ok(Json(films))
}
