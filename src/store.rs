//! Index store abstraction.
//!
//! The [`IndexStore`] trait defines the persistent collection of chunk
//! embeddings: bulk insert keyed by chunk id and nearest-neighbour query.
//! Two implementations are provided:
//!
//! - **[`SqliteStore`]** — durable, backed by a SQLite file; survives
//!   process restarts so the one-time ingestion is only paid once.
//! - **[`MemoryStore`]** — `RwLock`-guarded vectors for tests.
//!
//! Entries are content-addressed by id and never updated or deleted in
//! normal operation; similarity ranking is brute-force cosine over the
//! stored vectors, most-similar first, ties kept in insertion order.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::sync::RwLock;

use crate::db;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::CagError;

/// A chunk plus its embedding vector, as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// `"<filename>_<chunk_index>"`.
    pub id: String,
    pub text: String,
    /// Source document name; `None` models lost metadata.
    pub source: Option<String>,
    pub chunk_index: i64,
    pub vector: Vec<f32>,
}

/// A ranked entry returned from [`IndexStore::nearest`].
#[derive(Debug, Clone)]
pub struct RetrievedEntry {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// Persistent collection of chunk embeddings.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Number of entries currently stored.
    async fn count(&self) -> Result<u64, CagError>;

    /// Bulk insert, all-or-nothing. Re-inserting an existing id replaces
    /// that entry, so a retried ingestion cannot duplicate rows.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), CagError>;

    /// The `k` nearest stored entries to `query_vec`, most similar first.
    /// Returns fewer than `k` when the store holds fewer entries, and an
    /// empty vector for an empty store.
    async fn nearest(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedEntry>, CagError>;
}

// ============ SQLite store ============

/// SQLite-backed [`IndexStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the store at `path`.
    pub async fn open(path: &Path) -> Result<Self, CagError> {
        let pool = db::connect(path).await?;
        Ok(Self { pool })
    }

    #[allow(dead_code)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl IndexStore for SqliteStore {
    async fn count(&self) -> Result<u64, CagError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), CagError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let blob = vec_to_blob(&entry.vector);
            sqlx::query(
                r#"
                INSERT INTO entries (id, text, source, chunk_index, embedding)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    source = excluded.source,
                    chunk_index = excluded.chunk_index,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.text)
            .bind(&entry.source)
            .bind(entry.chunk_index)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn nearest(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedEntry>, CagError> {
        let rows = sqlx::query("SELECT id, text, source, embedding FROM entries ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;

        let mut candidates: Vec<RetrievedEntry> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                RetrievedEntry {
                    id: row.get("id"),
                    text: row.get("text"),
                    source: row.get("source"),
                    score: cosine_similarity(query_vec, &vector),
                }
            })
            .collect();

        // Stable sort keeps insertion order for equal scores
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);

        Ok(candidates)
    }
}

// ============ In-memory store ============

/// In-memory [`IndexStore`] for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn count(&self) -> Result<u64, CagError> {
        Ok(self.entries.read().unwrap().len() as u64)
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), CagError> {
        let mut stored = self.entries.write().unwrap();
        for entry in entries {
            if let Some(existing) = stored.iter_mut().find(|e| e.id == entry.id) {
                *existing = entry.clone();
            } else {
                stored.push(entry.clone());
            }
        }
        Ok(())
    }

    async fn nearest(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedEntry>, CagError> {
        let stored = self.entries.read().unwrap();

        let mut candidates: Vec<RetrievedEntry> = stored
            .iter()
            .map(|entry| RetrievedEntry {
                id: entry.id.clone(),
                text: entry.text.clone(),
                source: entry.source.clone(),
                score: cosine_similarity(query_vec, &entry.vector),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);

        Ok(candidates)
    }
}
