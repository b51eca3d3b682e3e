//! Document ingestion
//!
//! Loads raw documents from disk and splits them into overlapping chunks
//! sized for embedding. The loader is a thin I/O wrapper; the chunker is
//! where the splitting decisions live.

mod chunker;

pub use chunker::RecursiveChunker;

use crate::error::{MedibotError, Result};
use std::collections::HashMap;
use std::path::Path;

/// An immutable unit of ingested text.
///
/// Carries at minimum a `source` metadata key identifying where the
/// content was loaded from. Never mutated after load; re-ingestion
/// replaces documents wholesale.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A bounded-size fragment of a document, the atomic retrievable unit.
///
/// Inherits the parent document's metadata plus a `chunk_index` key.
/// Consecutive chunks of the same document overlap so that concepts
/// spanning a boundary remain retrievable from at least one chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

/// Load all `.txt` and `.md` files under a directory into documents.
///
/// Unreadable individual files are logged and skipped; a missing or
/// unreadable directory is an error.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let entries = std::fs::read_dir(dir).map_err(|e| MedibotError::Io {
        source: e,
        context: format!("Failed to read document directory: {:?}", dir),
    })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MedibotError::Io {
            source: e,
            context: format!("Failed to read directory entry in {:?}", dir),
        })?;
        let path = entry.path();

        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
            .unwrap_or(false);
        if !path.is_file() || !is_text {
            continue;
        }

        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!("Loaded document: {} ({} bytes)", source, content.len());
                documents.push(Document::new(content, source));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable file {:?}: {}", path, e);
            }
        }
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), dir);
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_documents_filters_extensions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "visiting hours are 9 to 5").unwrap();
        std::fs::write(temp.path().join("b.md"), "# appointments").unwrap();
        std::fs::write(temp.path().join("c.pdf"), [0u8, 1, 2]).unwrap();

        let docs = load_documents(temp.path()).unwrap();
        assert_eq!(docs.len(), 2);
        for doc in &docs {
            assert!(doc.metadata.contains_key("source"));
        }
    }

    #[test]
    fn test_load_documents_missing_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(load_documents(&missing).is_err());
    }

    #[test]
    fn test_document_source_metadata() {
        let doc = Document::new("content", "handbook.txt");
        assert_eq!(doc.metadata.get("source").unwrap(), "handbook.txt");
    }
}
