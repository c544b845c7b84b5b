use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, BooleanQuery, EmptyQuery, Occur, Query as TantivyQuery, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, NumericOptions, OwnedValue, STORED, STRING, Schema, TEXT,
    TantivyDocument,
};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, Order, ReloadPolicy, Term};
use tokio::task;
use tracing::{debug, info, warn};

use super::catalog::{FieldKind, IndexSpec};
use super::query::{Query, SearchRequest, SortField, SortOrder};
use super::{Hit, SearchBackend, SearchError};

const ID_FIELD: &str = "_id";
const SOURCE_FIELD: &str = "_source";
const WRITER_MEMORY_BUDGET: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
struct IndexedField {
    field: Field,
    kind: FieldKind,
    name: String,
}

#[derive(Clone)]
struct CatalogIndex {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    source_field: Field,
    fields: HashMap<String, IndexedField>,
}

/// Embedded search engine holding one Tantivy index per catalog.
#[derive(Clone, Default)]
pub struct TantivySearch {
    indexes: HashMap<String, Arc<CatalogIndex>>,
}

impl TantivySearch {
    /// Builds empty in-memory indexes for every spec.
    pub fn in_ram(specs: &[IndexSpec]) -> anyhow::Result<Self> {
        let mut indexes = HashMap::new();
        for spec in specs {
            let index = Index::create_in_ram(build_schema(spec));
            let catalog = CatalogIndex::new(index, spec)?;
            indexes.insert(spec.name.clone(), Arc::new(catalog));
        }
        Ok(Self { indexes })
    }

    /// Opens (or creates) one index per spec under `root/<index name>`.
    pub fn open_in_dir(root: &Path, specs: &[IndexSpec]) -> anyhow::Result<Self> {
        let mut indexes = HashMap::new();
        for spec in specs {
            let index_dir = root.join(&spec.name);
            let index = if index_dir.join("meta.json").exists() {
                Index::open_in_dir(&index_dir)
                    .with_context(|| format!("opening index at {}", index_dir.display()))?
            } else {
                std::fs::create_dir_all(&index_dir).with_context(|| {
                    format!("creating index directory {}", index_dir.display())
                })?;
                Index::create_in_dir(&index_dir, build_schema(spec))
                    .with_context(|| format!("creating index in {}", index_dir.display()))?
            };
            let catalog = CatalogIndex::new(index, spec)?;
            info!(index = %spec.name, path = %index_dir.display(), "opened search index");
            indexes.insert(spec.name.clone(), Arc::new(catalog));
        }
        Ok(Self { indexes })
    }

    pub fn document_count(&self, index: &str) -> Result<u64, SearchError> {
        Ok(self.catalog(index)?.reader.searcher().num_docs())
    }

    /// Adds JSON documents to `index` and makes them visible to searches.
    /// Documents without an `id` are skipped.
    pub async fn index_documents(&self, index: &str, docs: Vec<Value>) -> Result<usize, SearchError> {
        let catalog = Arc::clone(self.catalog(index)?);
        let index_name = index.to_string();
        task::spawn_blocking(move || catalog.write(&index_name, docs)).await?
    }

    fn catalog(&self, index: &str) -> Result<&Arc<CatalogIndex>, SearchError> {
        self.indexes
            .get(index)
            .ok_or_else(|| SearchError::UnknownIndex(index.to_string()))
    }
}

#[async_trait]
impl SearchBackend for TantivySearch {
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<Hit>, SearchError> {
        let catalog = self.catalog(index)?;
        let query = catalog.build_query(&request.query)?;
        let sort = match &request.sort {
            Some(sort) => Some(catalog.sort_key(sort)?),
            None => None,
        };
        let searcher = catalog.reader.searcher();

        // The collector preallocates `offset + limit` slots, so bound both by the index size.
        let total = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
        let size = request.effective_size();
        if size == 0 || request.from >= total {
            return Ok(Vec::new());
        }
        let limit = size.min(total - request.from);
        let collector = TopDocs::with_limit(limit).and_offset(request.from);
        let addresses = match sort {
            Some((field, order)) => searcher
                .search(&query, &collector.order_by_fast_field::<f64>(field, order))?
                .into_iter()
                .map(|(_, addr)| addr)
                .collect::<Vec<_>>(),
            None => searcher
                .search(&query, &collector)?
                .into_iter()
                .map(|(_, addr)| addr)
                .collect::<Vec<_>>(),
        };

        let mut hits = Vec::with_capacity(addresses.len());
        for addr in addresses {
            let doc = searcher.doc::<TantivyDocument>(addr)?;
            hits.push(catalog.to_hit(&doc)?);
        }
        debug!(%index, hits = hits.len(), "search completed");
        Ok(hits)
    }

    async fn get(&self, index: &str, id: &str) -> Result<Value, SearchError> {
        let catalog = self.catalog(index)?;
        let searcher = catalog.reader.searcher();
        let term = Term::from_field_text(catalog.id_field, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let hits = searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some((_, addr)) = hits.into_iter().next() else {
            return Err(SearchError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            });
        };
        let doc = searcher.doc::<TantivyDocument>(addr)?;
        Ok(catalog.to_hit(&doc)?.source)
    }
}

impl CatalogIndex {
    fn new(index: Index, spec: &IndexSpec) -> anyhow::Result<Self> {
        let schema = index.schema();
        let lookup = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| anyhow!("index '{}' is missing field {name}", spec.name))
        };

        let mut fields = HashMap::new();
        for field_spec in &spec.fields {
            let name = field_name(&field_spec.path);
            let field = lookup(&name)?;
            fields.insert(
                field_spec.path.clone(),
                IndexedField {
                    field,
                    kind: field_spec.kind,
                    name,
                },
            );
        }

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .with_context(|| format!("constructing reader for index '{}'", spec.name))?;

        Ok(Self {
            id_field: lookup(ID_FIELD)?,
            source_field: lookup(SOURCE_FIELD)?,
            index,
            reader,
            fields,
        })
    }

    fn write(&self, index_name: &str, docs: Vec<Value>) -> Result<usize, SearchError> {
        let mut writer = self
            .index
            .writer_with_num_threads::<TantivyDocument>(1, WRITER_MEMORY_BUDGET)?;

        let mut written = 0usize;
        for source in docs {
            let Some(id) = source.get("id").and_then(scalar_text) else {
                warn!(index = %index_name, "skipping document without id");
                continue;
            };

            let mut doc = TantivyDocument::default();
            doc.add_text(self.id_field, &id);
            doc.add_text(self.source_field, serde_json::to_string(&source)?);
            for (path, indexed) in &self.fields {
                for value in values_at_path(&source, path) {
                    match indexed.kind {
                        FieldKind::Number => {
                            if let Some(number) = scalar_number(value) {
                                doc.add_f64(indexed.field, number);
                            }
                        }
                        FieldKind::Keyword | FieldKind::Text => {
                            if let Some(text) = scalar_text(value) {
                                doc.add_text(indexed.field, &text);
                            }
                        }
                    }
                }
            }
            writer.add_document(doc)?;
            written += 1;
        }

        writer.commit()?;
        self.reader.reload()?;
        info!(index = %index_name, written, "indexed documents");
        Ok(written)
    }

    /// Resolves a sort key to its fast field. Only numeric fields sort.
    fn sort_key(&self, sort: &SortField) -> Result<(String, Order), SearchError> {
        let target = self.fields.get(&sort.field).ok_or_else(|| {
            SearchError::InvalidQuery(format!("no mapping for sort field '{}'", sort.field))
        })?;
        if target.kind != FieldKind::Number {
            return Err(SearchError::InvalidQuery(format!(
                "field '{}' is not sortable",
                sort.field
            )));
        }
        let order = match sort.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        Ok((target.name.clone(), order))
    }

    fn to_hit(&self, doc: &TantivyDocument) -> Result<Hit, SearchError> {
        let id = get_first_text(doc, self.id_field).unwrap_or_default();
        let source = match get_first_text(doc, self.source_field) {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Value::Null,
        };
        Ok(Hit { id, source })
    }

    fn build_query(&self, query: &Query) -> Result<Box<dyn TantivyQuery>, SearchError> {
        match query {
            Query::MatchAll => Ok(Box::new(AllQuery)),
            Query::Match { field, text } => self.match_query(field, text),
            Query::MultiMatch { text, fields } => {
                let targets: Vec<&str> = if fields.is_empty() {
                    self.fields
                        .iter()
                        .filter(|(_, indexed)| indexed.kind == FieldKind::Text)
                        .map(|(path, _)| path.as_str())
                        .collect()
                } else {
                    fields.iter().map(String::as_str).collect()
                };
                let mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
                for path in targets {
                    clauses.push((Occur::Should, self.match_query(path, text)?));
                }
                if clauses.is_empty() {
                    return Ok(Box::new(EmptyQuery));
                }
                Ok(Box::new(BooleanQuery::from(clauses)))
            }
            Query::Nested { path, query } => {
                let prefix = format!("{path}.");
                let mut inner = Vec::new();
                collect_fields(query, &mut inner);
                if let Some(outside) = inner.iter().find(|field| !field.starts_with(&prefix)) {
                    return Err(SearchError::InvalidQuery(format!(
                        "field '{outside}' is outside nested path '{path}'"
                    )));
                }
                self.build_query(query)
            }
            Query::Bool {
                should,
                minimum_should_match,
            } => {
                let minimum = minimum_should_match.unwrap_or(1);
                if minimum > 1 {
                    return Err(SearchError::InvalidQuery(format!(
                        "minimum_should_match of {minimum} is not supported"
                    )));
                }
                if should.is_empty() {
                    return Ok(Box::new(AllQuery));
                }
                let mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
                if minimum == 0 {
                    clauses.push((Occur::Must, Box::new(AllQuery)));
                }
                for clause in should {
                    clauses.push((Occur::Should, self.build_query(clause)?));
                }
                Ok(Box::new(BooleanQuery::from(clauses)))
            }
        }
    }

    fn match_query(&self, path: &str, text: &str) -> Result<Box<dyn TantivyQuery>, SearchError> {
        let Some(indexed) = self.fields.get(path) else {
            return Ok(Box::new(EmptyQuery));
        };

        if indexed.kind == FieldKind::Number {
            return Ok(match text.trim().parse::<f64>() {
                Ok(number) => Box::new(TermQuery::new(
                    Term::from_field_f64(indexed.field, number),
                    IndexRecordOption::Basic,
                )),
                Err(_) => Box::new(EmptyQuery),
            });
        }

        let mut analyzer = self.index.tokenizer_for_field(indexed.field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
        while stream.advance() {
            let term = Term::from_field_text(indexed.field, &stream.token().text);
            terms.push((
                Occur::Should,
                Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
            ));
        }

        Ok(match terms.len() {
            0 => Box::new(EmptyQuery),
            1 => terms.remove(0).1,
            _ => Box::new(BooleanQuery::from(terms)),
        })
    }
}

fn build_schema(spec: &IndexSpec) -> Schema {
    let mut schema_builder = Schema::builder();

    schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    schema_builder.add_text_field(SOURCE_FIELD, STORED);

    let numeric_options = NumericOptions::default().set_indexed().set_fast();
    for field in &spec.fields {
        let name = field_name(&field.path);
        match field.kind {
            FieldKind::Keyword => {
                schema_builder.add_text_field(&name, STRING);
            }
            FieldKind::Text => {
                schema_builder.add_text_field(&name, TEXT);
            }
            FieldKind::Number => {
                schema_builder.add_f64_field(&name, numeric_options.clone());
            }
        }
    }

    schema_builder.build()
}

/// Tantivy treats dots in field names as JSON paths, so nested paths are stored flat.
fn field_name(path: &str) -> String {
    path.replace('.', "__")
}

fn collect_fields<'a>(query: &'a Query, out: &mut Vec<&'a str>) {
    match query {
        Query::MatchAll => {}
        Query::Match { field, .. } => out.push(field),
        Query::MultiMatch { fields, .. } => out.extend(fields.iter().map(String::as_str)),
        Query::Nested { query, .. } => collect_fields(query, out),
        Query::Bool { should, .. } => should.iter().for_each(|clause| collect_fields(clause, out)),
    }
}

fn values_at_path<'a>(source: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![source];
    for segment in path.split('.') {
        current = flatten_arrays(current)
            .into_iter()
            .filter_map(|value| value.get(segment))
            .collect();
    }
    flatten_arrays(current)
}

fn flatten_arrays(values: Vec<&Value>) -> Vec<&Value> {
    values
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn get_first_text(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|value| match OwnedValue::from(value) {
            OwnedValue::Str(text) => Some(text),
            OwnedValue::PreTokStr(pre) => Some(pre.text),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::search::{IndexSpec, film_index};

    async fn films() -> TantivySearch {
        let engine = TantivySearch::in_ram(&[film_index("movies")]).unwrap();
        engine
            .index_documents(
                "movies",
                vec![
                    json!({
                        "id": "f1",
                        "title": "Star Wars",
                        "imdb_rating": 8.6,
                        "genres": ["Action", "Sci-Fi"],
                        "actors": [{"id": "p1", "name": "Mark Hamill"}],
                        "directors": [{"id": "p2", "name": "George Lucas"}],
                    }),
                    json!({
                        "id": "f2",
                        "title": "Star Trek",
                        "imdb_rating": 7.9,
                        "genres": "Sci-Fi",
                        "actors": [{"id": "p3", "name": "William Shatner"}],
                    }),
                    json!({"title": "no id"}),
                ],
            )
            .await
            .unwrap();
        engine
    }

    fn ids(hits: &[Hit]) -> Vec<&str> {
        hits.iter().map(|hit| hit.id.as_str()).collect()
    }

    #[test]
    fn nested_paths_collect_values_across_arrays() {
        let doc = json!({"actors": [{"name": "A"}, {"name": "B"}], "title": "T"});
        let names: Vec<_> = values_at_path(&doc, "actors.name")
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, ["A", "B"]);
        assert!(values_at_path(&doc, "writers.name").is_empty());
    }

    #[tokio::test]
    async fn documents_without_id_are_skipped() {
        let engine = films().await;
        assert_eq!(engine.document_count("movies").unwrap(), 2);
    }

    #[tokio::test]
    async fn get_returns_stored_source() {
        let engine = films().await;
        let source = engine.get("movies", "f1").await.unwrap();
        assert_eq!(source["title"], "Star Wars");
    }

    #[tokio::test]
    async fn get_missing_id_is_not_found() {
        let engine = films().await;
        let err = engine.get("movies", "nope").await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_index_is_reported() {
        let engine = films().await;
        let err = engine
            .search("shows", &SearchRequest::new(Query::MatchAll))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnknownIndex(_)));
    }

    #[tokio::test]
    async fn match_is_analyzed_and_case_insensitive() {
        let engine = films().await;
        let request = SearchRequest::new(Query::match_field("title", "WARS"));
        let hits = engine.search("movies", &request).await.unwrap();
        assert_eq!(ids(&hits), ["f1"]);
    }

    #[tokio::test]
    async fn match_on_unmapped_field_finds_nothing() {
        let engine = films().await;
        let request = SearchRequest::new(Query::match_field("tagline", "star"));
        assert!(engine.search("movies", &request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_should_query_matches_any_role_group() {
        let engine = films().await;
        let request = SearchRequest::new(Query::should_at_least(
            vec![
                Query::nested("actors", Query::match_field("actors.name", "George Lucas")),
                Query::nested(
                    "directors",
                    Query::match_field("directors.name", "George Lucas"),
                ),
            ],
            1,
        ));
        let hits = engine.search("movies", &request).await.unwrap();
        assert_eq!(ids(&hits), ["f1"]);
    }

    #[tokio::test]
    async fn nested_query_outside_path_is_invalid() {
        let engine = films().await;
        let request = SearchRequest::new(Query::nested("actors", Query::match_field("title", "x")));
        let err = engine.search("movies", &request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn sort_orders_by_numeric_field() {
        let engine = films().await;
        let desc = SearchRequest::new(Query::MatchAll).sorted_by(SortField::parse("-imdb_rating").unwrap());
        let asc = SearchRequest::new(Query::MatchAll).sorted_by(SortField::parse("imdb_rating").unwrap());
        assert_eq!(ids(&engine.search("movies", &desc).await.unwrap()), ["f1", "f2"]);
        assert_eq!(ids(&engine.search("movies", &asc).await.unwrap()), ["f2", "f1"]);
    }

    #[tokio::test]
    async fn sort_is_validated_on_an_empty_index() {
        let engine = TantivySearch::in_ram(&[film_index("movies")]).unwrap();
        let request = SearchRequest::new(Query::MatchAll).sorted_by(SortField::parse("title").unwrap());
        let err = engine.search("movies", &request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn sort_on_text_field_is_invalid() {
        let engine = films().await;
        let request = SearchRequest::new(Query::MatchAll).sorted_by(SortField::parse("title").unwrap());
        let err = engine.search("movies", &request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn empty_bool_matches_everything() {
        let engine = films().await;
        let request = SearchRequest::new(Query::should(Vec::new()));
        assert_eq!(engine.search("movies", &request).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn minimum_should_match_above_one_is_rejected() {
        let engine = films().await;
        let request = SearchRequest::new(Query::should_at_least(
            vec![Query::match_field("title", "star")],
            2,
        ));
        let err = engine.search("movies", &request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn multi_match_searches_every_text_field() {
        let engine = films().await;
        let request = SearchRequest::new(Query::multi_match("shatner"));
        assert_eq!(ids(&engine.search("movies", &request).await.unwrap()), ["f2"]);
    }

    #[tokio::test]
    async fn zero_size_returns_no_hits() {
        let engine = films().await;
        let request = SearchRequest::new(Query::MatchAll).limit(0);
        assert!(engine.search("movies", &request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_windows_are_bounded_by_the_index() {
        let engine = films().await;

        let everything = SearchRequest::new(Query::MatchAll).limit(1 << 40);
        assert_eq!(engine.search("movies", &everything).await.unwrap().len(), 2);

        let far = SearchRequest::new(Query::MatchAll).window(usize::MAX - 5, 50);
        assert!(engine.search("movies", &far).await.unwrap().is_empty());

        let tail = SearchRequest::new(Query::MatchAll)
            .sorted_by(SortField::parse("-imdb_rating").unwrap())
            .window(1, usize::MAX);
        assert_eq!(ids(&engine.search("movies", &tail).await.unwrap()), ["f2"]);
    }

    #[tokio::test]
    async fn genre_match_is_exact() {
        let engine = films().await;
        let request = SearchRequest::new(Query::match_field("genres", "Sci-Fi"));
        assert_eq!(engine.search("movies", &request).await.unwrap().len(), 2);

        let partial = SearchRequest::new(Query::match_field("genres", "Sci"));
        assert!(engine.search("movies", &partial).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reopening_a_directory_keeps_documents() {
        let dir = std::env::temp_dir().join(format!("movies-api-{}", uuid::Uuid::new_v4()));
        let specs = [IndexSpec::new("genres").field("name", FieldKind::Text)];

        let engine = TantivySearch::open_in_dir(&dir, &specs).unwrap();
        engine
            .index_documents("genres", vec![json!({"id": "g1", "name": "Drama"})])
            .await
            .unwrap();
        drop(engine);

        let reopened = TantivySearch::open_in_dir(&dir, &specs).unwrap();
        assert_eq!(reopened.document_count("genres").unwrap(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
