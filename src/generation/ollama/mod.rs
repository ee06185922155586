
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::GenerationClient;
use crate::config::{GenerationConfig, OllamaConfig};
use crate::http;
use crate::{RagError, Result};

/// Non-streaming completions from Ollama's `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    /// Talks to the server in `ollama` using the model in `generation`
    #[inline]
    pub fn new(ollama: &OllamaConfig, generation: &GenerationConfig) -> Result<Self> {
        let url = ollama
            .ollama_url()
            .map_err(|e| RagError::Config(e.to_string()))?
            .join("/api/generate")
            .map_err(|e| RagError::Config(format!("Invalid generate URL: {}", e)))?;

        Ok(Self {
            url,
            model: generation.model.clone(),
            agent: http::agent(Duration::from_secs(generation.timeout_seconds)),
        })
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String> {
        let body = serde_json::to_string(&GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
            },
        })
        .context("Failed to serialize generate request")?;

        let text = http::post_json(&self.agent, &self.url, &body, None)
            .context("Ollama generate request failed")?;

        let response: GenerateResponse =
            serde_json::from_str(&text).context("Failed to parse generate response")?;
        Ok(response.response)
    }
}

impl GenerationClient for OllamaGenerator {
    #[inline]
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        debug!(
            "Requesting up to {} tokens from {} (prompt length: {})",
            max_tokens,
            self.model,
            prompt.len()
        );
        self.request(prompt, max_tokens)
            .map_err(|e| RagError::Generation(format!("{:#}", e)))
    }
}
