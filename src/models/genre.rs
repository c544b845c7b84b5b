use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::utils::deserialize_non_empty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    #[serde(deserialize_with = "deserialize_non_empty")]
    pub name: String,
}
