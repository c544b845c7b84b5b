use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::services::Services;

use super::handlers::{
    film_details, films_alike, get_genre, healthz, list_films, list_genres, person_details,
    person_film_works, search_films, search_persons,
};

#[derive(Clone)]
pub struct AppState {
    pub(crate) services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/films", get(list_films))
        .route("/api/v1/films/", get(list_films))
        .route("/api/v1/films/search", get(search_films))
        .route("/api/v1/films/{film_id}", get(film_details))
        .route("/api/v1/films/{film_id}/alike", get(films_alike))
        .route("/api/v1/genres", get(list_genres))
        .route("/api/v1/genres/", get(list_genres))
        .route("/api/v1/genres/{genre_id}", get(get_genre))
        .route("/api/v1/persons/search", get(search_persons))
        .route("/api/v1/persons/{person_id}", get(person_details))
        .route("/api/v1/persons/{person_id}/films", get(person_film_works))
        .with_state(state)
}
