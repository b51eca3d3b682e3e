//! Answering pipeline
//!
//! Composes the retriever and the answer generator: retrieve context for
//! the query, then generate the final answer. `ask` is a total function
//! from the caller's perspective; the CLI above it never sees an error
//! from this module.

use crate::generate::AnswerGenerator;
use crate::retrieval::Retriever;

/// Separator between passages when the retrieved context is flattened
/// into the prompt.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Top-level question answering bot.
///
/// In degraded mode (no retriever) the generator runs with a permanently
/// empty context; the answer guarantees are unchanged.
pub struct Medibot {
    retriever: Option<Retriever>,
    generator: AnswerGenerator,
}

impl Medibot {
    pub fn new(retriever: Retriever, generator: AnswerGenerator) -> Self {
        tracing::info!("Medibot ready (retrieval enabled)");
        Self {
            retriever: Some(retriever),
            generator,
        }
    }

    /// Degraded construction without retrieval; every question is answered
    /// from the model ladder alone.
    pub fn without_retriever(generator: AnswerGenerator) -> Self {
        tracing::info!("Medibot ready (no retriever, degraded mode)");
        Self {
            retriever: None,
            generator,
        }
    }

    /// Answer a question. Always returns a non-empty string and never
    /// propagates an internal failure to the caller.
    pub async fn ask(&self, query: &str) -> String {
        let context = self.context_for(query);
        self.generator.ask(query, context.as_deref()).await
    }

    /// Retrieve context for the query, flattened to one string.
    ///
    /// `None` is the no-context sentinel: retrieval disabled, failed, or
    /// found nothing. The generator omits the context section entirely in
    /// that case.
    fn context_for(&self, query: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;
        let passages = retriever.retrieve(query);
        if passages.is_empty() {
            tracing::debug!("No context retrieved for query");
            return None;
        }

        tracing::debug!("Retrieved {} context passages", passages.len());
        Some(
            passages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(PASSAGE_SEPARATOR),
        )
    }
}
