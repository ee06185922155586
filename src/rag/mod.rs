// RAG module
// Retrieval, prompt assembly and generation composed into one answer call

pub mod cache;
pub mod context;


use std::sync::Arc;

use tracing::{debug, info};

pub use cache::CachedAnswerer;
pub use context::RagContext;

use crate::Result;
use crate::config::settings::{DEFAULT_MAX_TOKENS, DEFAULT_TOP_K};
use crate::generation::GenerationClient;
use crate::prompt::PromptAssembler;
use crate::retrieval::Retriever;

/// Anything that turns a question into an answer
pub trait Answerer: Send + Sync {
    fn answer(&self, query: &str) -> Result<String>;
}

/// Answers a question from the documents nearest to it.
///
/// Every failure from retrieval or generation is returned as-is.
pub struct RagOrchestrator {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn GenerationClient>,
    top_k: usize,
    max_tokens: u32,
}

impl RagOrchestrator {
    #[inline]
    pub fn new(retriever: Retriever, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::new(),
            generator,
            top_k: DEFAULT_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[inline]
    pub fn answer(&self, query: &str) -> Result<String> {
        let documents = self.retriever.retrieve(query, self.top_k)?;
        debug!(
            "Retrieved documents {:?} for query",
            documents.iter().map(|d| d.id).collect::<Vec<_>>()
        );

        let prompt = self.assembler.assemble(query, &documents);
        let answer = self.generator.complete(&prompt, self.max_tokens)?;

        info!(
            "Answered query using {} documents ({} characters)",
            documents.len(),
            answer.len()
        );
        Ok(answer)
    }
}

impl Answerer for RagOrchestrator {
    #[inline]
    fn answer(&self, query: &str) -> Result<String> {
        RagOrchestrator::answer(self, query)
    }
}
