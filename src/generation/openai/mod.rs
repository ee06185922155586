
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::GenerationClient;
use crate::config::GenerationConfig;
use crate::http;
use crate::{RagError, Result};

/// Client for an OpenAI-compatible legacy `/completions` endpoint
#[derive(Clone)]
pub struct OpenAiCompletions {
    url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for OpenAiCompletions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletions")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    text: String,
}

impl OpenAiCompletions {
    #[inline]
    pub fn new(base_url: &str, model: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let url = Url::parse(&format!("{}/completions", base_url.trim_end_matches('/')))
            .map_err(|e| RagError::Config(format!("Invalid OpenAI base URL {}: {}", base_url, e)))?;

        Ok(Self {
            url,
            model: model.to_string(),
            api_key,
            agent: http::agent(timeout),
        })
    }

    /// Reads the API key from the environment variable named in the config
    #[inline]
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RagError::Config(format!(
                    "OpenAI generation requires an API key in ${}",
                    config.api_key_env
                ))
            })?;

        Self::new(
            &config.openai_base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String> {
        let body = serde_json::to_string(&CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens,
        })
        .context("Failed to serialize completion request")?;

        let text = http::post_json(&self.agent, &self.url, &body, Some(&self.api_key))
            .context("Completion request failed")?;

        let response: CompletionResponse =
            serde_json::from_str(&text).context("Failed to parse completion response")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| anyhow!("Completion response contained no choices"))
    }
}

impl GenerationClient for OpenAiCompletions {
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
