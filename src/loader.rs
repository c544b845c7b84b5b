use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde_json::Value;
use tokio::task;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, CatalogNames};
use crate::search::{IndexSpec, TantivySearch, film_index, genre_index, person_index};

pub fn catalog_specs(catalogs: &CatalogNames) -> Vec<IndexSpec> {
    vec![
        film_index(&catalogs.films),
        genre_index(&catalogs.genres),
        person_index(&catalogs.persons),
    ]
}

/// Opens the on-disk catalog indexes and seeds any that are still empty.
pub async fn prepare_search(config: &AppConfig) -> Result<TantivySearch> {
    let index_dir = config.index_dir.clone();
    let specs = catalog_specs(&config.catalogs);
    let engine = task::spawn_blocking(move || TantivySearch::open_in_dir(&index_dir, &specs))
        .await
        .context("joining index open task")??;

    seed_indexes(&engine, &config.data_dir, &config.catalogs).await?;
    Ok(engine)
}

/// Loads `<data_dir>/<index>.jsonl[.gz]` into every index that has no documents yet.
pub async fn seed_indexes(
    engine: &TantivySearch,
    data_dir: &Path,
    catalogs: &CatalogNames,
) -> Result<()> {
    for index in [&catalogs.films, &catalogs.genres, &catalogs.persons] {
        let existing = engine.document_count(index)?;
        if existing > 0 {
            debug!(%index, existing, "index already populated");
            continue;
        }

        let Some(path) = seed_file(data_dir, index) else {
            warn!(%index, data_dir = %data_dir.display(), "no seed file; index stays empty");
            continue;
        };

        info!(%index, path = %path.display(), "seeding index");
        let docs = task::spawn_blocking(move || read_documents(&path))
            .await
            .context("joining seed read task")??;
        let written = engine
            .index_documents(index, docs)
            .await
            .with_context(|| format!("seeding index {index}"))?;
        info!(%index, written, "seeded index");
    }
    Ok(())
}

fn seed_file(data_dir: &Path, index: &str) -> Option<PathBuf> {
    [format!("{index}.jsonl"), format!("{index}.jsonl.gz")]
        .into_iter()
        .map(|name| data_dir.join(name))
        .find(|path| path.exists())
}

/// Reads one JSON document per line, skipping blank and unparsable lines.
fn read_documents(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut docs = Vec::new();
    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(doc) => docs.push(doc),
            Err(err) => warn!(
                path = %path.display(),
                line = number + 1,
                error = %err,
                "skipping unparsable seed line"
            ),
        }
    }
    Ok(docs)
}
