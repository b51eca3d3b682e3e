//! Medibot - Hospital Operations Assistant
//!
//! A retrieval-augmented question answering system for hospital operations.
//! Documents are chunked, embedded and stored in a persistent vector index;
//! queries retrieve relevant passages and an ordered ladder of chat-completion
//! providers generates the final answer, with quality gating and a rule-based
//! fallback that guarantees a response even when every provider is down.

pub mod bot;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod retrieval;
pub mod store;

pub use error::{MedibotError, Result};
