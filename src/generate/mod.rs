//! Answer generation with multi-provider fallback
//!
//! Deterministic decision procedure over a static ordered list of backend
//! model ids: guard, canned-answer shortcut, provider attempt loop with
//! response cleaning and a quality gate, and a rule-based fallback that
//! guarantees a non-empty answer. `ask` never returns an error to its
//! caller; every internal failure is absorbed into the ladder.

mod provider;
mod rules;

pub use provider::{ChatMessage, ChatProvider, OpenRouterClient, ProviderError};
pub use rules::{canned_answer, fallback_answer, GUIDANCE};

use crate::embedding::{cosine_similarity, EmbeddingProvider};
use regex::Regex;
use std::sync::Arc;

/// Refusal and hedge phrases that disqualify a candidate response.
const REFUSAL_PHRASES: &[&str] = &[
    "i cannot",
    "i'm unable",
    "i don't know",
    "no information",
    "not available",
    "cannot answer",
    "unable to",
    "sorry, i",
    "consult local",
    "check with",
    "ask experts",
    "i'm sorry",
    "limit exceed",
];

/// Tunable knobs for the generator; defaults reproduce the reference behavior.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Token budget passed to each provider attempt.
    pub max_tokens: u32,
    /// Candidates at or below this query similarity are rejected.
    pub similarity_threshold: f32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            similarity_threshold: 0.3,
        }
    }
}

/// Which rung of the fallback ladder produced an answer.
///
/// Internal bookkeeping only; the public surface stays a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    /// Empty-query guidance string.
    Guidance,
    /// Canned-answer table hit.
    Canned,
    /// A backend model, identified by its id.
    Model(String),
    /// Rule-based fallback after exhausting all providers.
    Fallback,
}

/// A generated answer together with its origin.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// Strips markup and truncates model output to at most two sentences.
struct ResponseCleaner {
    markup: Regex,
    whitespace: Regex,
}

impl ResponseCleaner {
    fn new() -> Self {
        Self {
            // regexes are fixed patterns, construction cannot fail
            markup: Regex::new(r"[*#_`\-]").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = self.markup.replace_all(text, "");
        let text = self.whitespace.replace_all(&text, " ");
        let text = text.trim();

        let sentences: Vec<&str> = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let kept = sentences
            .iter()
            .take(2)
            .copied()
            .collect::<Vec<_>>()
            .join(". ");
        if kept.is_empty() {
            return String::new();
        }
        format!("{}.", kept)
    }
}

/// Multi-provider answer generator with quality gating.
///
/// Providers are tried strictly in the configured priority order; the
/// first cleaned candidate passing the quality gate wins. The embedder is
/// optional: without one, the gate falls back to a coarse length
/// heuristic (the degraded mode the pipeline uses when retrieval is off).
pub struct AnswerGenerator {
    provider: Arc<dyn ChatProvider>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    models: Vec<String>,
    options: GeneratorOptions,
    cleaner: ResponseCleaner,
}

impl AnswerGenerator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        models: Vec<String>,
        options: GeneratorOptions,
    ) -> Self {
        Self {
            provider,
            embedder,
            models,
            options,
            cleaner: ResponseCleaner::new(),
        }
    }

    /// Generate an answer for the query with optional retrieved context.
    ///
    /// Total from the caller's perspective: always a non-empty string.
    pub async fn ask(&self, query: &str, context: Option<&str>) -> String {
        self.answer(query, context).await.text
    }

    /// Like [`ask`](Self::ask) but exposing which ladder rung answered.
    pub async fn answer(&self, query: &str, context: Option<&str>) -> Answer {
        let query = query.trim();
        if query.is_empty() {
            return Answer {
                text: rules::GUIDANCE.to_string(),
                source: AnswerSource::Guidance,
            };
        }

        // canned answers take precedence over all model calls
        if let Some(canned) = rules::canned_answer(query) {
            return Answer {
                text: canned.to_string(),
                source: AnswerSource::Canned,
            };
        }

        let prompt = build_prompt(query, context);
        let messages = vec![ChatMessage::user(prompt)];

        for model in &self.models {
            tracing::debug!("Trying model: {}", model);
            match self
                .provider
                .call(model, &messages, self.options.max_tokens)
                .await
            {
                Ok(raw) => {
                    let cleaned = self.cleaner.clean(&raw);
                    if self.passes_quality_gate(query, &cleaned) {
                        tracing::info!("Accepted response from {}", model);
                        return Answer {
                            text: cleaned,
                            source: AnswerSource::Model(model.clone()),
                        };
                    }
                    tracing::debug!("Low quality response from {}, trying next", model);
                }
                Err(e) => {
                    tracing::warn!("Model {} failed: {}", model, e);
                }
            }
        }

        Answer {
            text: rules::fallback_answer(query).to_string(),
            source: AnswerSource::Fallback,
        }
    }

    /// Heuristic checks a cleaned candidate must pass before being returned.
    fn passes_quality_gate(&self, query: &str, response: &str) -> bool {
        if response.len() < 10 {
            return false;
        }

        let lowered = response.to_lowercase();
        if REFUSAL_PHRASES.iter().any(|p| lowered.contains(p)) {
            return false;
        }

        match self.semantic_similarity(query, response) {
            Some(similarity) => similarity > self.options.similarity_threshold,
            // embedding unavailable: coarse length/content check
            None => response.len() > 20 && !response.starts_with("For"),
        }
    }

    fn semantic_similarity(&self, query: &str, response: &str) -> Option<f32> {
        let embedder = self.embedder.as_ref()?;
        let query_vec = embedder.embed(query).ok()?;
        let response_vec = embedder.embed(response).ok()?;
        Some(cosine_similarity(&query_vec, &response_vec))
    }
}

/// Instruction-style prompt embedding the question and, when present,
/// the retrieved context. The context section is omitted entirely for
/// the no-context sentinel.
fn build_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.trim().is_empty() => format!(
            "You are MediBot, a hospital management assistant. Answer in 1-2 short sentences maximum. No formatting.\n\n\
             Context: {context}\n\
             Question: {query}\n\n\
             Short practical answer:"
        ),
        _ => format!(
            "You are MediBot, a hospital management assistant. Answer in 1-2 short sentences maximum. No formatting.\n\n\
             Question: {query}\n\n\
             Short practical answer:"
        ),
    }
}
