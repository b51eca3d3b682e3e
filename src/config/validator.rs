//! Configuration validation

use super::Config;
use crate::error::{MedibotError, Result, ValidationError};

/// Validates configuration values
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_meta(config, &mut errors);
        Self::validate_chunking(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_generation(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MedibotError::ConfigValidation { errors })
        }
    }

    fn validate_meta(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.meta.schema_version.is_empty() {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                "Schema version cannot be empty",
            ));
        }
    }

    fn validate_chunking(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "Chunk size must be greater than 0",
            ));
        }

        if config.chunking.chunk_overlap >= config.chunking.chunk_size {
            errors.push(ValidationError::new(
                "chunking.chunk_overlap",
                "Chunk overlap must be smaller than chunk size",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Embedding dimension must be greater than 0",
            ));
        }

        if config.embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if config.retrieval.hnsw_m == 0 {
            errors.push(ValidationError::new(
                "retrieval.hnsw_m",
                "HNSW M parameter must be greater than 0",
            ));
        }

        if config.retrieval.hnsw_ef_construction == 0 {
            errors.push(ValidationError::new(
                "retrieval.hnsw_ef_construction",
                "HNSW ef_construction must be greater than 0",
            ));
        }

        if config.retrieval.hnsw_ef_search == 0 {
            errors.push(ValidationError::new(
                "retrieval.hnsw_ef_search",
                "HNSW ef_search must be greater than 0",
            ));
        }
    }

    fn validate_generation(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.generation.endpoint.is_empty() {
            errors.push(ValidationError::new(
                "generation.endpoint",
                "Endpoint cannot be empty",
            ));
        }

        if config.generation.api_key_env.is_empty() {
            errors.push(ValidationError::new(
                "generation.api_key_env",
                "API key environment variable name cannot be empty",
            ));
        }

        if config.generation.models.is_empty() {
            errors.push(ValidationError::new(
                "generation.models",
                "At least one model must be configured",
            ));
        }

        if !(0.0..=2.0).contains(&config.generation.temperature) {
            errors.push(ValidationError::new(
                "generation.temperature",
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        if config.generation.max_tokens == 0 {
            errors.push(ValidationError::new(
                "generation.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }

        if config.generation.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "generation.request_timeout_secs",
                "Request timeout must be greater than 0",
            ));
        }

        if !(-1.0..=1.0).contains(&config.generation.similarity_threshold) {
            errors.push(ValidationError::new(
                "generation.similarity_threshold",
                "Similarity threshold must be between -1.0 and 1.0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_empty_model_ladder_rejected() {
        let mut config = Config::default();
        config.generation.models.clear();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_similarity_threshold_out_of_range() {
        let mut config = Config::default();
        config.generation.similarity_threshold = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        config.embedding.model.clear();
        config.retrieval.top_k = 0;

        match ConfigValidator::validate(&config) {
            Err(MedibotError::ConfigValidation { errors }) => {
                assert!(errors.len() >= 3);
            }
            _ => panic!("Expected validation failure"),
        }
    }
}
