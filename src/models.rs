//! Core data types used throughout the CAG pipeline.
//!
//! These types represent the chunks, retrieved context pieces, and query
//! results that flow through ingestion and answering.

use serde::Serialize;

/// One chunk of a source document, ready for indexing.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// `"<filename>_<chunk_index>"` — unique across the whole corpus.
    pub id: String,
    /// Plain-text chunk content.
    pub text: String,
    /// Filename of the originating document.
    pub source: String,
    /// Ordinal position of this chunk within its document.
    pub chunk_index: usize,
}

/// A retrieved context piece handed to the generation stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    pub content: String,
    /// Source document name, or `"Unknown"` when metadata was lost.
    pub source: String,
}

/// Result of one `process_query` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub initial_context: Vec<ContextEntry>,
    pub answer: String,
}

/// Intermediate artifacts of the augmentation pipeline, scoped to a single
/// query's processing.
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    pub analysis: String,
    pub augmentation: String,
    pub answer: String,
}

/// Render retrieved context as a source-attributed prompt block.
pub fn context_block(entries: &[ContextEntry]) -> String {
    entries
        .iter()
        .map(|ctx| format!("From {}:\n{}", ctx.source, ctx.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_block_prefixes_sources() {
        let entries = vec![
            ContextEntry {
                content: "Pinot Noir £8".to_string(),
                source: "wine.md".to_string(),
            },
            ContextEntry {
                content: "Margherita £10".to_string(),
                source: "pizza.md".to_string(),
            },
        ];
        let block = context_block(&entries);
        assert!(block.starts_with("From wine.md:\nPinot Noir £8"));
        assert!(block.contains("From pizza.md:\nMargherita £10"));
    }

    #[test]
    fn test_context_block_empty() {
        assert_eq!(context_block(&[]), "");
    }
}
