//! End-to-end pipeline tests with a real vector store and stub providers

use async_trait::async_trait;
use medibot::bot::Medibot;
use medibot::embedding::{EmbeddingError, EmbeddingProvider};
use medibot::generate::{
    AnswerGenerator, ChatMessage, ChatProvider, GeneratorOptions, ProviderError, GUIDANCE,
};
use medibot::ingest::Chunk;
use medibot::retrieval::Retriever;
use medibot::store::VectorStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DIM: usize = 4;

/// Deterministic keyword embedder: each topic maps to one axis.
struct AxisEmbedder;

impl AxisEmbedder {
    fn vector_for(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        if lowered.contains("appointment") {
            vec![1.0, 0.0, 0.0, 0.0]
        } else if lowered.contains("emergency") || lowered.contains("ambulance") {
            vec![0.0, 1.0, 0.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0, 0.0]
        }
    }
}

impl EmbeddingProvider for AxisEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vector_for(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "axis-test"
    }
}

/// Records the prompt it received and echoes a fixed answer.
struct EchoProvider {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl EchoProvider {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for EchoProvider {
    async fn call(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<String, ProviderError> {
        for message in messages {
            self.prompts.lock().unwrap().push(message.content.clone());
        }
        Ok(self.answer.clone())
    }
}

/// Always fails, forcing the rule-based fallback.
struct DownProvider;

#[async_trait]
impl ChatProvider for DownProvider {
    async fn call(
        &self,
        model: &str,
        _messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<String, ProviderError> {
        Err(ProviderError::Status {
            model: model.to_string(),
            status: 503,
            detail: "down".to_string(),
        })
    }
}

fn chunk(content: &str) -> Chunk {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), "hospital_faq.txt".to_string());
    Chunk {
        content: content.to_string(),
        metadata,
    }
}

fn seeded_store(temp: &TempDir) -> Arc<VectorStore> {
    let store = VectorStore::open(temp.path(), DIM, 200, 16, 50).unwrap();
    let chunks = vec![
        chunk("Appointments are booked through the patient dashboard."),
        chunk("Emergency cases go directly to the triage desk."),
        chunk("The cafeteria serves meals from 7am to 8pm."),
    ];
    let vectors: Vec<Vec<f32>> = chunks
        .iter()
        .map(|c| AxisEmbedder::vector_for(&c.content))
        .collect();
    store.add(&chunks, &vectors).unwrap();
    Arc::new(store)
}

fn bot_with(provider: Arc<dyn ChatProvider>, store: Arc<VectorStore>) -> Medibot {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(AxisEmbedder);
    let retriever = Retriever::new(embedder.clone(), store, 3);
    let generator = AnswerGenerator::new(
        provider,
        Some(embedder),
        vec!["test/model".to_string()],
        GeneratorOptions::default(),
    );
    Medibot::new(retriever, generator)
}

#[tokio::test]
async fn test_empty_query_gets_guidance() {
    let temp = TempDir::new().unwrap();
    let bot = bot_with(Arc::new(DownProvider), seeded_store(&temp));

    assert_eq!(bot.ask("").await, GUIDANCE);
    assert_eq!(bot.ask("   \t\n").await, GUIDANCE);
}

#[tokio::test]
async fn test_canned_answer_wins_even_when_providers_are_down() {
    let temp = TempDir::new().unwrap();
    let bot = bot_with(Arc::new(DownProvider), seeded_store(&temp));

    let answer = bot.ask("hello").await;
    assert!(answer.contains("MediBot"));
}

#[tokio::test]
async fn test_retrieved_context_reaches_the_prompt() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(EchoProvider::new(
        "Schedule follow-up appointments through the dashboard.",
    ));
    let bot = bot_with(provider.clone(), seeded_store(&temp));

    // avoid canned triggers so the model path runs
    let answer = bot.ask("what is the appointment procedure?").await;
    assert!(answer.contains("dashboard"));

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Context:"));
    assert!(prompts[0].contains("Appointments are booked through the patient dashboard."));
}

#[tokio::test]
async fn test_all_providers_down_uses_category_fallback() {
    let temp = TempDir::new().unwrap();
    let bot = bot_with(Arc::new(DownProvider), seeded_store(&temp));

    let answer = bot.ask("can I get my prescription refilled?").await;
    assert!(answer.contains("prescription"));
    assert!(!answer.is_empty());
}

#[tokio::test]
async fn test_degraded_mode_without_retriever() {
    let provider = Arc::new(EchoProvider::new(
        "Visiting hours run from 9am until 5pm every day.",
    ));
    let generator = AnswerGenerator::new(
        provider.clone(),
        None,
        vec!["test/model".to_string()],
        GeneratorOptions::default(),
    );
    let bot = Medibot::without_retriever(generator);

    let answer = bot.ask("what are the visiting hours?").await;
    assert!(answer.contains("9am"));

    // no retrieval means no context section in the prompt
    let prompts = provider.prompts();
    assert!(!prompts[0].contains("Context:"));
}

#[tokio::test]
async fn test_empty_store_degrades_to_no_context() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(VectorStore::open(temp.path(), DIM, 200, 16, 50).unwrap());
    let provider = Arc::new(EchoProvider::new(
        "The gift shop is in the main lobby area.",
    ));
    let bot = bot_with(provider.clone(), store);

    let answer = bot.ask("where is the gift shop?").await;
    assert!(answer.contains("lobby"));
    assert!(!provider.prompts()[0].contains("Context:"));
}
