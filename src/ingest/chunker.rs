//! Recursive document chunking
//!
//! Splits text hierarchically, preferring natural boundaries: paragraphs,
//! then sentences, then words, falling back to a raw character window.
//! Consecutive chunks of the same document are seeded with the tail of the
//! previous chunk so that concepts spanning a boundary stay retrievable.

use super::{Chunk, Document};

/// Boundary preference order: paragraph, sentence, word.
const SEPARATORS: &[&str] = &["\n\n", ". ", "! ", "? ", " "];

/// Splits documents into overlapping chunks bounded by `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new chunker.
    ///
    /// # Arguments
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - target number of shared characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split a batch of documents into chunks.
    ///
    /// Empty input yields an empty output, not an error. Chunk order within
    /// each document is preserved and every chunk inherits its document's
    /// metadata plus a `chunk_index` key.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        if documents.is_empty() {
            tracing::warn!("No documents to chunk");
            return Vec::new();
        }

        let mut chunks = Vec::new();
        for document in documents {
            if document.content.is_empty() {
                continue;
            }

            let pieces = split_and_merge(
                &document.content,
                self.chunk_size,
                self.chunk_overlap,
                SEPARATORS,
            );

            for (i, content) in pieces.into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                chunks.push(Chunk { content, metadata });
            }
        }

        tracing::info!(
            "Created {} chunks from {} documents",
            chunks.len(),
            documents.len()
        );
        chunks
    }
}

/// Split text by the first separator, then merge segments back into chunks
/// that respect `chunk_size`. Oversized segments recurse into the next-level
/// separator. Each new chunk is seeded with the tail of the previous one.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }
    if separators.is_empty() {
        return split_by_size(text, chunk_size, chunk_overlap);
    }

    let separator = separators[0];
    let remaining = &separators[1..];
    let segments = split_keeping_separator(text, separator);

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for segment in segments {
        if current.is_empty() {
            current = segment.to_string();
        } else if current.len() + segment.len() <= chunk_size {
            current.push_str(segment);
        } else {
            flush(&mut chunks, current, chunk_size, chunk_overlap, remaining);
            // seed the next chunk with the tail of the last emitted one
            current = chunks
                .last()
                .map(|c| overlap_tail(c, chunk_overlap))
                .unwrap_or_default();
            current.push_str(segment);
        }
    }

    if !current.is_empty() {
        flush(&mut chunks, current, chunk_size, chunk_overlap, remaining);
    }

    chunks
}

fn flush(
    chunks: &mut Vec<String>,
    current: String,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) {
    if current.len() > chunk_size {
        chunks.extend(split_and_merge(
            &current,
            chunk_size,
            chunk_overlap,
            separators,
        ));
    } else {
        chunks.push(current);
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so no characters are lost when segments are re-merged.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Raw character-window splitting with overlap, used when no natural
/// boundary fits. Window edges are snapped to char boundaries.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // a single multi-byte char wider than the window
            end = (start + chunk_size).min(text.len());
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
        }

        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }

        let step = chunk_size.saturating_sub(chunk_overlap);
        if step == 0 {
            break;
        }
        let mut next = start + step;
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}

/// Last `overlap` bytes of `text`, snapped forward to a char boundary.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    if text.len() <= overlap {
        return text.to_string();
    }
    let mut start = text.len() - overlap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new(content, "test.txt")
    }

    #[test]
    fn test_empty_batch() {
        let chunker = RecursiveChunker::new(300, 100);
        assert!(chunker.split(&[]).is_empty());
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunker = RecursiveChunker::new(300, 100);
        let chunks = chunker.split(&[doc("Visiting hours are 9am to 5pm.")]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Visiting hours are 9am to 5pm.");
        assert_eq!(chunks[0].metadata.get("chunk_index").unwrap(), "0");
        assert_eq!(chunks[0].metadata.get("source").unwrap(), "test.txt");
    }

    #[test]
    fn test_long_document_produces_multiple_chunks() {
        let sentence = "The hospital pharmacy dispenses prescribed medication every day. ";
        let text = sentence.repeat(20); // well over chunk_size
        let chunker = RecursiveChunker::new(300, 100);
        let chunks = chunker.split(&[doc(&text)]);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 300);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let sentence = "Appointments can be booked through the patient dashboard online. ";
        let text = sentence.repeat(15);
        let overlap = 100;
        let chunker = RecursiveChunker::new(300, overlap);
        let chunks = chunker.split(&[doc(&text)]);
        assert!(chunks.len() >= 2);

        for pair in chunks.windows(2) {
            let prev = &pair[0].content;
            let next = &pair[1].content;
            let shared = overlap.min(prev.len()).min(next.len());
            assert!(
                prev.ends_with(&next[..shared]),
                "chunks do not overlap: {:?} / {:?}",
                prev,
                next
            );
        }
    }

    #[test]
    fn test_chunk_order_preserved() {
        let text = (0..30)
            .map(|i| format!("Sentence number {} about hospital services. ", i))
            .collect::<String>();
        let chunker = RecursiveChunker::new(200, 50);
        let chunks = chunker.split(&[doc(&text)]);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.get("chunk_index").unwrap(), &i.to_string());
        }
        // first sentence appears in the first chunk, last in the last
        assert!(chunks.first().unwrap().content.contains("Sentence number 0"));
        assert!(chunks.last().unwrap().content.contains("Sentence number 29"));
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let text = "First sentence about cardiology. Second sentence about radiology. \
                    Third sentence about the emergency department. Fourth sentence about billing."
            .to_string();
        let chunker = RecursiveChunker::new(70, 0);
        let chunks = chunker.split(&[doc(&text)]);

        assert!(chunks.len() >= 2);
        // no chunk should cut a word in half when sentence boundaries fit
        for chunk in &chunks {
            assert!(chunk.content.len() <= 70);
        }
    }

    #[test]
    fn test_word_level_fallback_for_long_sentences() {
        // one long "sentence" with no sentence boundary at all
        let text = "word ".repeat(200);
        let chunker = RecursiveChunker::new(100, 20);
        let chunks = chunker.split(&[doc(&text)]);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 100);
        }
    }

    #[test]
    fn test_multibyte_content_does_not_panic() {
        let text = "Ärztliche Betreuung rund um die Uhr. ".repeat(30);
        let chunker = RecursiveChunker::new(120, 40);
        let chunks = chunker.split(&[doc(&text)]);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_multiple_documents_independent_indices() {
        let chunker = RecursiveChunker::new(300, 100);
        let chunks = chunker.split(&[doc("short one"), doc("short two")]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.get("chunk_index").unwrap(), "0");
        assert_eq!(chunks[1].metadata.get("chunk_index").unwrap(), "0");
    }
}
