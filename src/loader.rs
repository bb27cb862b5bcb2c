//! Document loader: a folder of markdown files → indexable chunk records.
//!
//! Inclusion is by file extension only (`.md`). Each file is rendered to
//! plain text, chunked, and emitted as `(text, {source, chunk_index}, id)`
//! triples where `id = "<filename>_<chunk_index>"`. The scan is sorted for
//! determinism, but callers must only rely on id uniqueness — never on
//! cross-file chunk ordering.

use std::path::Path;

use walkdir::WalkDir;

use crate::chunk::split_text;
use crate::config::ChunkingConfig;
use crate::error::CagError;
use crate::extract::markdown_to_text;
use crate::models::ChunkRecord;

const MARKDOWN_EXTENSION: &str = "md";

/// Load every markdown document under `folder` (non-recursive) and chunk it.
pub fn load_documents(
    folder: &Path,
    chunking: &ChunkingConfig,
) -> Result<Vec<ChunkRecord>, CagError> {
    if !folder.is_dir() {
        return Err(CagError::Configuration(format!(
            "data folder does not exist: {}",
            folder.display()
        )));
    }

    let mut files: Vec<_> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
                .unwrap_or(false)
        })
        .collect();
    files.sort_by_key(|entry| entry.file_name().to_os_string());

    let mut records = Vec::new();

    for entry in files {
        let path = entry.path();
        let source = entry.file_name().to_string_lossy().to_string();

        let raw = std::fs::read_to_string(path).map_err(|e| {
            CagError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        let text = markdown_to_text(&raw);
        let chunks = split_text(&text, chunking.chunk_size, chunking.overlap)?;

        for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
            records.push(ChunkRecord {
                id: format!("{}_{}", source, chunk_index),
                text: chunk_text,
                source: source.clone(),
                chunk_index,
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn chunking() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 40,
            overlap: 10,
        }
    }

    #[test]
    fn test_ids_unique_across_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.md"),
            "# Starters\n\nBruschetta £5, olives £3, garlic bread £4, soup of the day £6.",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.md"),
            "# Mains\n\nLasagne £11, risotto £12, sea bass £16, margherita pizza £10.",
        )
        .unwrap();

        let records = load_documents(dir.path(), &chunking()).unwrap();
        assert!(records.len() >= 2);

        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), records.len(), "ids must be pairwise distinct");
        assert!(records.iter().any(|r| r.source == "a.md"));
        assert!(records.iter().any(|r| r.source == "b.md"));
    }

    #[test]
    fn test_id_format() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("wine.md"), "Pinot Noir £8").unwrap();

        let records = load_documents(dir.path(), &chunking()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "wine.md_0");
        assert_eq!(records[0].chunk_index, 0);
    }

    #[test]
    fn test_non_markdown_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("menu.md"), "Tiramisu £6").unwrap();
        fs::write(dir.path().join("notes.txt"), "internal notes").unwrap();
        fs::write(dir.path().join("logo.png"), [0u8; 4]).unwrap();

        let records = load_documents(dir.path(), &chunking()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "menu.md");
    }

    #[test]
    fn test_markup_stripped_before_chunking() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("menu.md"), "## Desserts\n\n**Tiramisu** £6").unwrap();

        let records = load_documents(dir.path(), &chunking()).unwrap();
        let all_text: String = records.iter().map(|r| r.text.as_str()).collect();
        assert!(all_text.contains("Tiramisu £6"));
        assert!(!all_text.contains('#'));
        assert!(!all_text.contains("**"));
    }

    #[test]
    fn test_missing_folder_is_configuration_error() {
        let err = load_documents(Path::new("/nonexistent/menus"), &chunking()).unwrap_err();
        assert!(matches!(err, CagError::Configuration(_)));
    }
}
