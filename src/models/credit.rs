use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Actor,
    Director,
    Writer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Actor, Role::Director, Role::Writer];

    /// Name of the film document field listing people in this role.
    pub fn group(self) -> &'static str {
        match self {
            Role::Actor => "actors",
            Role::Director => "directors",
            Role::Writer => "writers",
        }
    }
}

/// A film credit: the film id and the roles a person held on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilmWork {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    pub roles: Vec<Role>,
}
