//! Error taxonomy for the CAG pipeline.
//!
//! Every fallible core operation returns one of these variants so callers
//! can tell a missing credential from an unreachable index from a failed
//! model call. Errors propagate to the caller of `process_query`,
//! `populate`, or `retrieve`; nothing is swallowed into an empty result
//! except the documented missing-metadata fallback in retrieval.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CagError {
    /// Required credential or configuration value is missing or invalid.
    /// Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The vector/embedding backend is unreachable, unauthenticated, or
    /// returned an unusable response. During ingestion this aborts
    /// population before anything is written.
    #[error("index store unavailable: {0}")]
    IndexUnavailable(String),

    /// A generative-model call failed. Fatal to the current stage and
    /// therefore to the whole pipeline invocation; the core never retries
    /// beyond the transport-level backoff.
    #[error("generation failed: {0}")]
    Generation(String),

    /// `overlap >= chunk_size` would make the chunker loop forever.
    /// Detected before any chunk is emitted.
    #[error("invalid chunking configuration: overlap {overlap} must be smaller than chunk_size {chunk_size}")]
    ChunkingConfiguration { chunk_size: usize, overlap: usize },

    /// The query string failed request validation (empty or over-long).
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<sqlx::Error> for CagError {
    fn from(err: sqlx::Error) -> Self {
        CagError::IndexUnavailable(err.to_string())
    }
}
