mod credit;
mod film;
mod genre;
mod person;
mod utils;

pub use credit::{PersonFilmWork, Role};
pub use film::{Film, FilmDetails, FilmDocument};
pub use genre::Genre;
pub use person::{Person, PersonWithFilms};
