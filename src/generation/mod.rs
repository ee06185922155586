// Generation module
// Completion clients for the configured text generation service

pub mod ollama;
pub mod openai;


use std::sync::Arc;

use tracing::info;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiCompletions;

use crate::Result;
use crate::config::{Config, GenerationProvider};

/// Turns a prompt into generated text.
///
/// A call either returns the service's text unmodified or fails with
/// [`crate::RagError::Generation`]; nothing is retried.
pub trait GenerationClient: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Construct the client selected by `[generation] provider`
#[inline]
pub fn from_config(config: &Config) -> Result<Arc<dyn GenerationClient>> {
    info!(
        "Using {} generation with model {}",
        config.generation.provider.as_str(),
        config.generation.model
    );
    let client: Arc<dyn GenerationClient> = match config.generation.provider {
        GenerationProvider::Ollama => {
            Arc::new(OllamaGenerator::new(&config.ollama, &config.generation)?)
        }
        GenerationProvider::OpenAi => Arc::new(OpenAiCompletions::from_config(&config.generation)?),
    };
    Ok(client)
}
