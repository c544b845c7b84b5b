use super::SearchError;

/// Hits returned when a request does not ask for a page size.
pub const DEFAULT_SIZE: usize = 10;

/// Upper bound used by lookups that want "everything" from a small catalog.
pub const SCAN_LIMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Match {
        field: String,
        text: String,
    },
    /// Matches `text` against every listed field; an empty list means every text field.
    MultiMatch {
        text: String,
        fields: Vec<String>,
    },
    Nested {
        path: String,
        query: Box<Query>,
    },
    Bool {
        should: Vec<Query>,
        minimum_should_match: Option<usize>,
    },
}

impl Query {
    pub fn match_field(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
        }
    }

    pub fn multi_match(text: impl Into<String>) -> Self {
        Self::MultiMatch {
            text: text.into(),
            fields: Vec::new(),
        }
    }

    pub fn nested(path: impl Into<String>, query: Query) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    pub fn should(clauses: Vec<Query>) -> Self {
        Self::Bool {
            should: clauses,
            minimum_should_match: None,
        }
    }

    pub fn should_at_least(clauses: Vec<Query>, minimum: usize) -> Self {
        Self::Bool {
            should: clauses,
            minimum_should_match: Some(minimum),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    /// Decodes `[-]field`: a leading `-` sorts descending, anything else ascending.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let raw = raw.trim();
        let (field, order) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortOrder::Desc),
            None => (raw, SortOrder::Asc),
        };
        if field.is_empty() {
            return Err(SearchError::InvalidQuery(format!(
                "sort key '{raw}' names no field"
            )));
        }
        Ok(Self {
            field: field.to_string(),
            order,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    pub sort: Option<SortField>,
    pub from: usize,
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            sort: None,
            from: 0,
            size: None,
        }
    }

    pub fn sorted_by(mut self, sort: SortField) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn window(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = Some(size);
        self
    }

    pub fn limit(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn effective_size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_SIZE)
    }
}
