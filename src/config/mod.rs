//! Configuration management for Medibot
//!
//! Handles loading, validation and defaults for the answering pipeline:
//! storage paths, chunking parameters, the embedding model, retrieval
//! settings and the ordered provider ladder of the answer generator.

use crate::error::{MedibotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root data directory; the vector store lives underneath it.
    pub data_dir: PathBuf,
    /// Directory the ingest command reads documents from.
    pub documents_dir: PathBuf,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Shared characters between consecutive chunks of one document.
    pub chunk_overlap: usize,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Must match the model's output dimension.
    pub dimension: usize,
    pub batch_size: usize,
}

/// Retrieval and vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages returned per query.
    pub top_k: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_m: usize,
    pub hnsw_ef_search: usize,
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat-completions endpoint shared by all models in the ladder.
    pub endpoint: String,
    /// Environment variable holding the bearer credential.
    pub api_key_env: String,
    /// Ordered provider ladder, most preferred first.
    pub models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// Candidates at or below this query similarity are rejected.
    pub similarity_threshold: f32,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MedibotError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MedibotError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| MedibotError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: MEDIBOT_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("MEDIBOT_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "RETRIEVAL__TOP_K" => {
                self.retrieval.top_k =
                    value.parse().map_err(|_| MedibotError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "GENERATION__ENDPOINT" => {
                self.generation.endpoint = value.to_string();
            }
            "GENERATION__API_KEY_ENV" => {
                self.generation.api_key_env = value.to_string();
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MedibotError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("medibot").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| MedibotError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".medibot"))
    }

    /// Directory the vector store persists to.
    pub fn vector_store_dir(&self) -> PathBuf {
        self.storage.data_dir.join("vector_store")
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("~/.medibot");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                data_dir: data_dir.clone(),
                documents_dir: data_dir.join("documents"),
            },
            chunking: ChunkingConfig {
                chunk_size: 300,
                chunk_overlap: 100,
            },
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                dimension: 384,
                batch_size: 32,
            },
            retrieval: RetrievalConfig {
                top_k: 3,
                hnsw_ef_construction: 200,
                hnsw_m: 16,
                hnsw_ef_search: 50,
            },
            generation: GenerationConfig {
                endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
                api_key_env: "OPENROUTER_API_KEY".to_string(),
                models: vec![
                    "tngtech/deepseek-r1t2-chimera:free".to_string(),
                    "deepseek/deepseek-chat-v3-0324:free".to_string(),
                    "mistralai/mistral-small-3.2-24b-instruct:free".to_string(),
                    "google/gemini-2.0-flash-exp:free".to_string(),
                    "meta-llama/llama-3.3-70b-instruct:free".to_string(),
                    "nousresearch/hermes-3-llama-3.1-405b:free".to_string(),
                    "meta-llama/llama-3.2-3b-instruct:free".to_string(),
                ],
                temperature: 0.3,
                max_tokens: 150,
                request_timeout_secs: 30,
                similarity_threshold: 0.3,
            },
        }
    }
}
