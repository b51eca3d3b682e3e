//! Persistent vector store
//!
//! Nearest-neighbor store mapping embedding vectors to `(text, metadata)`
//! records. Records are appended to a JSON-lines log inside the store
//! directory; the HNSW graph is rebuilt from the log on open, so reopening
//! the same directory exposes every previously added record for querying.
//! A corrupt or unreadable log is a fatal open error, never a silently
//! empty store.

use crate::ingest::Chunk;
use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// File name of the append-only record log inside the store directory.
const RECORDS_FILE: &str = "records.jsonl";

/// Capacity hint for the HNSW graph.
const MAX_ELEMENTS: usize = 100_000;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {message}")]
    OpenError { path: PathBuf, message: String },

    #[error("Corrupt store record at {path} line {line}: {message}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Chunk/vector length mismatch: {chunks} chunks, {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One persisted entry: a fresh opaque id, the chunk text, its metadata
/// and the embedding vector it was inserted with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: Uuid,
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub vector: Vec<f32>,
}

/// Query hit: record payload plus its cosine similarity to the query vector.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub score: f32,
}

/// Persistent nearest-neighbor store over cosine similarity.
///
/// Append-mostly: concurrent reads are safe, writes take the inner locks.
/// Records keep their insertion order, which also breaks similarity ties.
pub struct VectorStore {
    dir: PathBuf,
    dimension: usize,
    ef_search: usize,
    hnsw_m: usize,
    hnsw_ef_construction: usize,
    records: RwLock<Vec<StoreRecord>>,
    index: RwLock<Hnsw<'static, f32, DistCosine>>,
}

impl VectorStore {
    /// Open (or create) a store rooted at `dir`.
    ///
    /// Replays the record log into a fresh HNSW graph. Open failure is
    /// fatal to the store: corrupt records or a dimension mismatch are
    /// reported as errors instead of starting empty.
    pub fn open(
        dir: &Path,
        dimension: usize,
        hnsw_ef_construction: usize,
        hnsw_m: usize,
        ef_search: usize,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::OpenError {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let records_path = dir.join(RECORDS_FILE);
        let mut records: Vec<StoreRecord> = Vec::new();

        if records_path.exists() {
            let file = std::fs::File::open(&records_path).map_err(|e| StoreError::OpenError {
                path: records_path.clone(),
                message: e.to_string(),
            })?;

            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| StoreError::Corrupt {
                    path: records_path.clone(),
                    line: line_no + 1,
                    message: e.to_string(),
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: StoreRecord =
                    serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                        path: records_path.clone(),
                        line: line_no + 1,
                        message: e.to_string(),
                    })?;
                if record.vector.len() != dimension {
                    return Err(StoreError::Corrupt {
                        path: records_path.clone(),
                        line: line_no + 1,
                        message: format!(
                            "vector dimension {} does not match store dimension {}",
                            record.vector.len(),
                            dimension
                        ),
                    });
                }
                records.push(record);
            }
        }

        let index = Hnsw::<f32, DistCosine>::new(
            hnsw_m,
            MAX_ELEMENTS,
            16, // max layer
            hnsw_ef_construction,
            DistCosine,
        );
        for (position, record) in records.iter().enumerate() {
            index.insert((&record.vector, position));
        }

        tracing::info!(
            "Vector store ready at {:?} ({} records)",
            dir,
            records.len()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            dimension,
            ef_search,
            hnsw_m,
            hnsw_ef_construction,
            records: RwLock::new(records),
            index: RwLock::new(index),
        })
    }

    /// Add chunks with their embedding vectors.
    ///
    /// Each record gets a fresh unique id; re-ingesting the same document
    /// produces duplicate retrievable entries. An empty batch is a no-op
    /// with a warning. Chunk and vector counts must match.
    pub fn add(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<(), StoreError> {
        if chunks.len() != vectors.len() {
            return Err(StoreError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        if chunks.is_empty() {
            tracing::warn!("No chunks to add to vector store");
            return Ok(());
        }
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(StoreError::InvalidDimension {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::InsertError("records lock poisoned".to_string()))?;
        let index = self
            .index
            .write()
            .map_err(|_| StoreError::InsertError("index lock poisoned".to_string()))?;

        let records_path = self.dir.join(RECORDS_FILE);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&records_path)?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let record = StoreRecord {
                id: Uuid::new_v4(),
                text: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                vector: vector.clone(),
            };

            let line = serde_json::to_string(&record)
                .map_err(|e| StoreError::InsertError(e.to_string()))?;
            writeln!(file, "{}", line)?;

            let position = records.len();
            index.insert((&record.vector, position));
            records.push(record);
        }
        file.flush()?;

        tracing::info!(
            "Added {} records to vector store (total: {})",
            chunks.len(),
            records.len()
        );
        Ok(())
    }

    /// Query the `k` nearest records by cosine similarity.
    ///
    /// An empty store yields an empty result. `k` is clamped to the number
    /// of stored records; results are ordered by descending similarity with
    /// ties broken by insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>, StoreError> {
        if vector.len() != self.dimension {
            return Err(StoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let records = self
            .records
            .read()
            .map_err(|_| StoreError::InsertError("records lock poisoned".to_string()))?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let k = k.min(records.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let index = self
            .index
            .read()
            .map_err(|_| StoreError::InsertError("index lock poisoned".to_string()))?;
        let ef_search = self.ef_search.max(k);
        let neighbours = index.search(vector, k, ef_search);

        let mut hits: Vec<(usize, f32)> = neighbours
            .into_iter()
            .filter(|n| n.d_id < records.len())
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect();
        // descending score, insertion order on ties
        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        Ok(hits
            .into_iter()
            .map(|(position, score)| {
                let record = &records[position];
                ScoredRecord {
                    text: record.text.clone(),
                    metadata: record.metadata.clone(),
                    score,
                }
            })
            .collect())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension this store was opened with.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Drop all records and start over with an empty graph.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::InsertError("records lock poisoned".to_string()))?;
        let mut index = self
            .index
            .write()
            .map_err(|_| StoreError::InsertError("index lock poisoned".to_string()))?;

        let records_path = self.dir.join(RECORDS_FILE);
        if records_path.exists() {
            std::fs::remove_file(&records_path)?;
        }

        records.clear();
        *index = Hnsw::<f32, DistCosine>::new(
            self.hnsw_m,
            MAX_ELEMENTS,
            16,
            self.hnsw_ef_construction,
            DistCosine,
        );
        Ok(())
    }
}
