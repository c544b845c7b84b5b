use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credit::Role;
use super::genre::Genre;
use super::person::Person;
use super::utils::{deserialize_null_default, deserialize_one_or_many};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
}

/// Single-film view with genre names resolved to full genres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDetails {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub actors: Vec<Person>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub writers: Vec<Person>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub directors: Vec<Person>,
}

/// A film as stored in the search index: genres by name, people grouped by role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilmDocument {
    #[serde(alias = "uuid")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub actors: Vec<Person>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub writers: Vec<Person>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub directors: Vec<Person>,
}

impl FilmDocument {
    pub fn people(&self, role: Role) -> &[Person] {
        match role {
            Role::Actor => &self.actors,
            Role::Writer => &self.writers,
            Role::Director => &self.directors,
        }
    }

    /// Roles in which someone named `name` appears, in actor, director, writer order.
    pub fn roles_of(&self, name: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.people(*role).iter().any(|person| person.name == name))
            .collect()
    }

    pub fn into_details(self, genres: Vec<Genre>) -> FilmDetails {
        FilmDetails {
            id: self.id,
            title: self.title,
            imdb_rating: self.imdb_rating,
            description: self.description,
            genres,
            actors: self.actors,
            writers: self.writers,
            directors: self.directors,
        }
    }
}
