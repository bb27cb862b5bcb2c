//! Top-k context retrieval with source attribution.
//!
//! Embeds the query with the same provider used at ingestion and maps the
//! store's nearest entries to `{content, source}` pairs. Missing source
//! metadata degrades to `"Unknown"` rather than failing the retrieval; an
//! empty store yields an empty result, not an error.

use std::sync::Arc;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::CagError;
use crate::models::ContextEntry;
use crate::store::IndexStore;

/// Fallback source label when an entry's metadata was lost.
pub const UNKNOWN_SOURCE: &str = "Unknown";

pub struct Retriever {
    store: Arc<dyn IndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(store: Arc<dyn IndexStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// The top-`k` chunks most relevant to `query`, similarity-descending.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ContextEntry>, CagError> {
        if k == 0 || self.store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embedder.as_ref(), query).await?;
        let hits = self.store.nearest(&query_vec, k).await?;

        Ok(hits
            .into_iter()
            .map(|hit| ContextEntry {
                content: hit.text,
                source: hit.source.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            })
            .collect())
    }
}
