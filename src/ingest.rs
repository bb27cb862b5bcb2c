//! One-time index population.
//!
//! Embeds loaded chunk records and bulk-inserts them into the index store.
//! Population is idempotent at the collection level: a non-empty store is
//! left untouched, which guards against re-paying embedding cost on every
//! process start. The guard cannot detect a corpus that changed since the
//! first population — delete the store file and re-run `cag init` after
//! editing the documents.
//!
//! All embeddings are computed before anything is written and the insert is
//! a single all-or-nothing call, so a failed ingestion leaves the store
//! empty and the next startup retries from scratch.

use tracing::info;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::CagError;
use crate::loader;
use crate::models::ChunkRecord;
use crate::store::{IndexEntry, IndexStore, SqliteStore};

/// What [`populate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// The store already held entries; nothing was written.
    AlreadyPopulated { entries: u64 },
    /// The store was empty and has been filled.
    Populated { entries: u64 },
}

/// Embed `records` and insert them into `store`, unless it is already
/// populated.
pub async fn populate(
    store: &dyn IndexStore,
    embedder: &dyn EmbeddingProvider,
    records: &[ChunkRecord],
    batch_size: usize,
) -> Result<PopulateOutcome, CagError> {
    let existing = store.count().await?;
    if existing > 0 {
        info!(entries = existing, "index already populated, skipping ingestion");
        return Ok(PopulateOutcome::AlreadyPopulated { entries: existing });
    }

    if records.is_empty() {
        return Ok(PopulateOutcome::Populated { entries: 0 });
    }

    let mut entries = Vec::with_capacity(records.len());

    for batch in records.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != batch.len() {
            return Err(CagError::IndexUnavailable(format!(
                "embedding count mismatch: sent {} texts, got {} vectors",
                batch.len(),
                vectors.len()
            )));
        }

        for (record, vector) in batch.iter().zip(vectors) {
            entries.push(IndexEntry {
                id: record.id.clone(),
                text: record.text.clone(),
                source: Some(record.source.clone()),
                chunk_index: record.chunk_index as i64,
                vector,
            });
        }
    }

    store.upsert(&entries).await?;
    info!(entries = entries.len(), "index populated");

    Ok(PopulateOutcome::Populated {
        entries: entries.len() as u64,
    })
}

/// CLI entry point for `cag init`: load the documents folder and populate
/// the configured SQLite store.
pub async fn run_init(config: &Config) -> Result<(), CagError> {
    let records = loader::load_documents(&config.data.folder, &config.chunking)?;
    let store = SqliteStore::open(&config.db.path).await?;
    let embedder = embedding::create_embedder(&config.embedding)?;

    let outcome = populate(
        &store,
        embedder.as_ref(),
        &records,
        config.embedding.batch_size,
    )
    .await?;

    println!("init");
    println!("  documents folder: {}", config.data.folder.display());
    println!("  chunks loaded: {}", records.len());
    match outcome {
        PopulateOutcome::AlreadyPopulated { entries } => {
            println!("  index: already populated ({entries} entries), skipped");
        }
        PopulateOutcome::Populated { entries } => {
            println!("  index: {entries} entries written");
        }
    }
    println!("ok");

    Ok(())
}
