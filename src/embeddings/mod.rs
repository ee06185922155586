// Embeddings module
// Text to vector encoding behind the EmbeddingProvider trait, with the Ollama adapter

pub mod ollama;

pub use ollama::OllamaClient;

use crate::Result;

/// Fixed-length vector representation of a piece of text
pub type Embedding = Vec<f32>;

/// Maps text to a fixed-dimension vector.
///
/// Implementations are constructed once and shared; `encode` must be
/// deterministic for identical input within one index build.
pub trait EmbeddingProvider: Send + Sync {
    fn encode(&self, text: &str) -> Result<Embedding>;

    /// Encode several texts, preserving order
    #[inline]
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Identifier of the underlying model, recorded in the index manifest
    fn model_name(&self) -> &str;
}
