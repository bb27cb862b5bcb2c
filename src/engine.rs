//! Query engine: retrieval plus the configured answer strategy.
//!
//! Both answer paths — the single-call fast generator and the three-stage
//! augmentation pipeline — sit behind the same
//! [`QueryEngine::process_query`] contract, chosen once at construction by
//! `generation.mode`. The engine is `Send + Sync`; the surrounding service
//! shares one instance across concurrent queries, and all per-query state
//! stays local to each invocation.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, GenerationConfig};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::CagError;
use crate::generate::{self, ChatProvider, OpenAiChat};
use crate::ingest;
use crate::loader;
use crate::models::QueryOutcome;
use crate::pipeline::AugmentationPipeline;
use crate::retrieve::Retriever;
use crate::store::{IndexStore, SqliteStore};

/// Upper bound on accepted query length, in characters.
pub const MAX_QUERY_CHARS: usize = 500;

/// Which answer strategy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// One model call over the retrieved context.
    Fast,
    /// Analysis → augmentation → generation.
    Pipeline,
}

impl GenerationMode {
    pub fn parse(mode: &str) -> Result<Self, CagError> {
        match mode {
            "fast" => Ok(Self::Fast),
            "pipeline" => Ok(Self::Pipeline),
            other => Err(CagError::Configuration(format!(
                "unknown generation mode: '{other}' (use fast or pipeline)"
            ))),
        }
    }
}

pub struct QueryEngine {
    store: Arc<dyn IndexStore>,
    retriever: Retriever,
    chat: Arc<dyn ChatProvider>,
    generation: GenerationConfig,
    top_k: usize,
    mode: GenerationMode,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn IndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        generation: GenerationConfig,
        top_k: usize,
    ) -> Result<Self, CagError> {
        let mode = GenerationMode::parse(&generation.mode)?;
        let retriever = Retriever::new(store.clone(), embedder);

        Ok(Self {
            store,
            retriever,
            chat,
            generation,
            top_k,
            mode,
        })
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Entries currently held by the index store (used by health checks).
    pub async fn entry_count(&self) -> Result<u64, CagError> {
        self.store.count().await
    }

    /// Answer a free-text question about the menu.
    ///
    /// Fails — never silently degrades — when the query is empty or
    /// over-long, or when the index store is unreachable or unpopulated.
    pub async fn process_query(&self, query: &str) -> Result<QueryOutcome, CagError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CagError::InvalidQuery("query must not be empty".to_string()));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(CagError::InvalidQuery(format!(
                "query exceeds {MAX_QUERY_CHARS} characters"
            )));
        }

        if self.store.count().await? == 0 {
            return Err(CagError::IndexUnavailable(
                "index store is empty — run `cag init` to ingest the documents folder".to_string(),
            ));
        }

        let initial_context = self.retriever.retrieve(query, self.top_k).await?;
        info!(chunks = initial_context.len(), "retrieved context");

        let answer = match self.mode {
            GenerationMode::Fast => {
                generate::fast_answer(
                    self.chat.as_ref(),
                    &self.generation,
                    query,
                    &initial_context,
                )
                .await?
            }
            GenerationMode::Pipeline => {
                let pipeline =
                    AugmentationPipeline::new(self.chat.clone(), self.generation.clone());
                pipeline.run(query, &initial_context).await?.answer
            }
        };

        Ok(QueryOutcome {
            query: query.to_string(),
            initial_context,
            answer,
        })
    }
}

/// Build a ready-to-serve engine from configuration: open the store, run
/// the one-time ingestion if the store is empty, and wire up providers.
pub async fn bootstrap(config: &Config) -> Result<QueryEngine, CagError> {
    let store: Arc<dyn IndexStore> = Arc::new(SqliteStore::open(&config.db.path).await?);
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::from(embedding::create_embedder(&config.embedding)?);

    if store.count().await? == 0 {
        let records = loader::load_documents(&config.data.folder, &config.chunking)?;
        ingest::populate(
            store.as_ref(),
            embedder.as_ref(),
            &records,
            config.embedding.batch_size,
        )
        .await?;
    }

    let chat: Arc<dyn ChatProvider> = Arc::new(OpenAiChat::new(&config.generation)?);

    QueryEngine::new(
        store,
        embedder,
        chat,
        config.generation.clone(),
        config.retrieval.top_k,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(GenerationMode::parse("fast").unwrap(), GenerationMode::Fast);
        assert_eq!(
            GenerationMode::parse("pipeline").unwrap(),
            GenerationMode::Pipeline
        );
        assert!(matches!(
            GenerationMode::parse("turbo"),
            Err(CagError::Configuration(_))
        ));
    }
}
