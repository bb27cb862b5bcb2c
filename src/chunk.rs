//! Fixed-window overlapping text chunker.
//!
//! Splits plain text into windows of `chunk_size` characters, each sharing
//! `overlap` characters with its predecessor. The final window may be
//! shorter. Offsets are character offsets, not byte offsets — menu text
//! contains non-ASCII currency symbols.
//!
//! `overlap >= chunk_size` would stop the window from ever advancing, so it
//! is rejected before the loop runs.

use crate::error::CagError;

/// Split `text` into overlapping fixed-size windows.
///
/// Returns an empty vector for empty input; otherwise no emitted chunk is
/// empty and every chunk except the last has exactly `chunk_size`
/// characters.
///
/// # Errors
///
/// [`CagError::ChunkingConfiguration`] when `overlap >= chunk_size`
/// (which includes `chunk_size == 0`). No chunks are emitted in that case.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, CagError> {
    if overlap >= chunk_size {
        return Err(CagError::ChunkingConfiguration {
            chunk_size,
            overlap,
        });
    }

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reassemble a chunk list by dropping each successor's leading overlap.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("hello", 10, 2).unwrap();
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let chunks = split_text("", 10, 2).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_window_lengths() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = split_text(text, 10, 3).unwrap();
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), 10);
        }
        assert!(chunks.last().unwrap().chars().count() <= 10);
    }

    #[test]
    fn test_reconstruction_exact() {
        let text = "The quick brown fox jumps over the lazy dog, twice on Sundays.";
        for (size, overlap) in [(10, 3), (16, 5), (7, 0), (100, 20)] {
            let chunks = split_text(text, size, overlap).unwrap();
            assert_eq!(
                reconstruct(&chunks, overlap),
                text,
                "failed for size={size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn test_reconstruction_multibyte() {
        let text = "Pinot Noir £8 · Chianti £9 · Prosecco £7 — by the glass";
        let chunks = split_text(text, 12, 4).unwrap();
        assert_eq!(reconstruct(&chunks, 4), text);
    }

    #[test]
    fn test_overlap_shared_with_predecessor() {
        let text = "0123456789abcdefghij";
        let chunks = split_text(text, 10, 4).unwrap();
        let tail: String = chunks[0].chars().skip(10 - 4).collect();
        let head: String = chunks[1].chars().take(4).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn test_exact_multiple_emits_trailing_overlap() {
        // 10 chars, size 10, overlap 2: window advances to 8 < 10, so one
        // short trailing chunk covering only overlapped text is emitted.
        let chunks = split_text("0123456789", 10, 2).unwrap();
        assert_eq!(chunks, vec!["0123456789".to_string(), "89".to_string()]);
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let err = split_text("some text", 500, 500).unwrap_err();
        assert!(matches!(
            err,
            CagError::ChunkingConfiguration {
                chunk_size: 500,
                overlap: 500
            }
        ));
    }

    #[test]
    fn test_overlap_larger_than_size_rejected() {
        let err = split_text("some text", 500, 1000).unwrap_err();
        assert!(matches!(err, CagError::ChunkingConfiguration { .. }));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = split_text("some text", 0, 0).unwrap_err();
        assert!(matches!(err, CagError::ChunkingConfiguration { .. }));
    }
}
