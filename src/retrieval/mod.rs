//! Context retrieval
//!
//! Turns a query string into an ordered list of relevant passages by
//! embedding the query and asking the vector store for its nearest
//! records. Failures at this boundary degrade to an empty result; the
//! caller treats empty as "proceed without context", never as an error
//! to surface to the end user.

use crate::embedding::EmbeddingProvider;
use crate::store::VectorStore;
use std::collections::HashMap;
use std::sync::Arc;

/// A retrieved passage: chunk text with its metadata, ranked by the store.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub score: f32,
}

/// Retrieves the top-k most similar passages for a query.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Retrieve up to `top_k` passages ranked by descending similarity.
    ///
    /// Empty or whitespace-only queries return an empty result immediately,
    /// without an embedding call. Embedding or store failures are logged and
    /// converted to an empty result.
    pub fn retrieve(&self, query: &str) -> Vec<Passage> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let vector = match self.embedder.embed(query) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Query embedding failed, retrieving no context: {}", e);
                return Vec::new();
            }
        };

        match self.store.query(&vector, self.top_k) {
            Ok(records) => records
                .into_iter()
                .map(|r| Passage {
                    text: r.text,
                    metadata: r.metadata,
                    score: r.score,
                })
                .collect(),
            Err(e) => {
                tracing::warn!("Vector store query failed, retrieving no context: {}", e);
                Vec::new()
            }
        }
    }
}
