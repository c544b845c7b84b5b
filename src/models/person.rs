use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credit::PersonFilmWork;
use super::utils::deserialize_null_default;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    #[serde(rename = "full_name", alias = "name")]
    pub name: String,
}

/// A person together with every film credit found for their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonWithFilms {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    #[serde(rename = "full_name", alias = "name")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub films: Vec<PersonFilmWork>,
}

impl PersonWithFilms {
    pub fn new(person: Person, films: Vec<PersonFilmWork>) -> Self {
        Self {
            id: person.id,
            name: person.name,
            films,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn full_name_alias_round_trips_through_cache_shape() {
        let id = Uuid::new_v4();
        let person: Person =
            serde_json::from_value(json!({"id": id, "name": "Carrie Fisher"})).unwrap();
        let wire = serde_json::to_value(&person).unwrap();
        assert_eq!(wire, json!({"uuid": id, "full_name": "Carrie Fisher"}));
        let back: Person = serde_json::from_value(wire).unwrap();
        assert_eq!(back, person);
    }

    #[test]
    fn films_are_always_present() {
        let id = Uuid::new_v4();
        let bare: PersonWithFilms =
            serde_json::from_value(json!({"id": id, "name": "Nobody"})).unwrap();
        assert!(bare.films.is_empty());
        let null: PersonWithFilms =
            serde_json::from_value(json!({"id": id, "name": "Nobody", "films": null})).unwrap();
        assert!(null.films.is_empty());
        assert_eq!(serde_json::to_value(&bare).unwrap()["films"], json!([]));
    }
}
