use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact-match string, indexed untokenized.
    Keyword,
    /// Analyzed full text.
    Text,
    /// Numeric value, usable as a sort key.
    Number,
}

/// A document path indexed by the engine. Nested paths use dots (`actors.name`)
/// and collect every value found under arrays along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, path: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec::new(path, kind));
        self
    }
}

pub fn film_index(name: &str) -> IndexSpec {
    let mut spec = IndexSpec::new(name)
        .field("title", FieldKind::Text)
        .field("description", FieldKind::Text)
        .field("imdb_rating", FieldKind::Number)
        .field("genres", FieldKind::Keyword);
    for role in Role::ALL {
        let group = role.group();
        spec = spec
            .field(format!("{group}.id"), FieldKind::Keyword)
            .field(format!("{group}.name"), FieldKind::Text);
    }
    spec
}

/// Genres are only ever looked up by their exact name.
pub fn genre_index(name: &str) -> IndexSpec {
    IndexSpec::new(name).field("name", FieldKind::Keyword)
}

pub fn person_index(name: &str) -> IndexSpec {
    IndexSpec::new(name).field("name", FieldKind::Text)
}
